//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available everywhere tests run.

use crate::classify::Classifier;
use crate::error::MachineError;
use crate::id::{EntityId, ItemTypeId, LocationKey, Ticks};
use crate::item::{Inventory, ItemKey, ItemStack};
use crate::machine::{MachineInstance, MachineKind, MachineState};
use crate::registry::KindRegistry;
use crate::storage::StorageAllocator;
use crate::tile::{Tile, TileArea};
use crate::world::{Entity, EntityPayload, Layer, Location, World};
use std::sync::Arc;

// ===========================================================================
// Item constructors
// ===========================================================================

pub fn iron() -> ItemKey {
    ItemKey::object(ItemTypeId(0))
}

pub fn iron_ingot() -> ItemKey {
    ItemKey::object(ItemTypeId(1))
}

// ===========================================================================
// Locations and entities
// ===========================================================================

pub fn farm_key() -> LocationKey {
    LocationKey::new("farm")
}

pub fn farm(width: u32, height: u32) -> Location {
    Location::new(farm_key(), width, height)
}

pub fn location_named(name: &str, width: u32, height: u32) -> Location {
    Location::new(LocationKey::new(name), width, height)
}

pub fn chest(name: &str, x: i32, y: i32) -> Entity {
    chest_with_capacity(name, x, y, 100)
}

pub fn chest_with_capacity(name: &str, x: i32, y: i32, capacity: u32) -> Entity {
    Entity::new(
        name,
        Layer::Object,
        TileArea::single(Tile::new(x, y)),
        EntityPayload::Inventory(Inventory::new(capacity)),
    )
}

/// The universal-link container; name matches the default config.
pub fn link_chest(x: i32, y: i32) -> Entity {
    chest("link chest", x, y)
}

pub fn fence_at(x: i32, y: i32) -> Entity {
    Entity::new(
        "fence",
        Layer::Object,
        TileArea::single(Tile::new(x, y)),
        EntityPayload::Decorative,
    )
}

pub fn machine_entity(name: &str, area: TileArea) -> Entity {
    Entity::new(name, Layer::Object, area, EntityPayload::Machine(Default::default()))
}

/// A 1x1 press machine entity.
pub fn press_at(x: i32, y: i32) -> Entity {
    machine_entity("press", TileArea::single(Tile::new(x, y)))
}

pub fn faulty_at(x: i32, y: i32) -> Entity {
    machine_entity("faulty", TileArea::single(Tile::new(x, y)))
}

// ===========================================================================
// Machine kinds
// ===========================================================================

/// Consumes one `input` item and yields one `output` item after
/// `duration` ticks.
#[derive(Debug)]
pub struct PressKind {
    pub input: ItemKey,
    pub output: ItemKey,
    pub duration: Ticks,
}

impl Default for PressKind {
    fn default() -> Self {
        Self {
            input: iron(),
            output: iron_ingot(),
            duration: 2,
        }
    }
}

impl MachineKind for PressKind {
    fn id(&self) -> &str {
        "test/press"
    }

    fn set_input(
        &self,
        world: &mut World,
        machine: &MachineInstance,
        storage: &StorageAllocator<'_>,
        now: Ticks,
    ) -> Result<bool, MachineError> {
        let state = machine
            .body(world)
            .map(|body| body.state(now))
            .ok_or(MachineError::MissingEntity)?;
        if state != MachineState::Empty {
            return Ok(false);
        }
        let input = self.input;
        if !storage.try_consume(world, |s| s.key == input, 1) {
            return Ok(false);
        }
        let body = machine.body_mut(world).ok_or(MachineError::MissingEntity)?;
        body.start(ItemStack::new(self.output, 1), now + self.duration);
        Ok(true)
    }
}

/// Always reports `Done` and always fails to yield its output. Used to
/// exercise fault isolation.
#[derive(Debug)]
pub struct FaultyKind;

impl MachineKind for FaultyKind {
    fn id(&self) -> &str {
        "test/faulty"
    }

    fn state(&self, _world: &World, _machine: &MachineInstance, _now: Ticks) -> MachineState {
        MachineState::Done
    }

    fn output(
        &self,
        _world: &World,
        _machine: &MachineInstance,
        _now: Ticks,
    ) -> Result<ItemStack, MachineError> {
        Err(MachineError::Kind("output jammed".to_string()))
    }

    fn set_input(
        &self,
        _world: &mut World,
        _machine: &MachineInstance,
        _storage: &StorageAllocator<'_>,
        _now: Ticks,
    ) -> Result<bool, MachineError> {
        Ok(false)
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// Kinds for the fixture entities: `press` and `faulty`.
pub fn fixture_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry.register("press", Arc::new(PressKind::default()));
    registry.register("faulty", Arc::new(FaultyKind));
    registry
}

/// The standard classifier over [`fixture_registry`], with `fence` as a
/// connector and the default link-chest name.
pub fn fixture_classifier() -> Classifier {
    Classifier::standard(
        Arc::new(fixture_registry()),
        "link chest",
        vec!["fence".to_string()],
    )
}

/// A detached press instance for tests that only need group structure.
pub fn fixture_machine() -> MachineInstance {
    MachineInstance::new(
        Arc::new(PressKind::default()),
        farm_key(),
        EntityId::default(),
        TileArea::single(Tile::new(0, 0)),
    )
}
