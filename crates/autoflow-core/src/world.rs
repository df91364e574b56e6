//! The in-memory world model: locations, placed entities, and their live
//! state.
//!
//! The world owns all mutable entity state (container inventories, machine
//! runtime bodies). Machine groups only hold ids into these arenas, so a
//! location rescan replaces the groups without touching entity state — a
//! machine mid-cycle stays mid-cycle across a reload.

use crate::id::{EntityId, LocationKey};
use crate::item::Inventory;
use crate::machine::MachineBody;
use crate::tile::{Tile, TileArea};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// The layer a placed entity lives on. Layers are scanned in declaration
/// order when several entities overlap one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Object,
    TerrainFeature,
    Building,
    Furniture,
}

impl Layer {
    /// All layers, in scan order.
    pub fn all() -> [Layer; 4] {
        [
            Layer::Object,
            Layer::TerrainFeature,
            Layer::Building,
            Layer::Furniture,
        ]
    }
}

/// Live state attached to a placed entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityPayload {
    /// An item store (chest-like). Carries the inventory.
    Inventory(Inventory),
    /// A processing entity. Carries the generic machine runtime body;
    /// behavior comes from the kind recognized for the entity's name.
    Machine(MachineBody),
    /// No behavior of its own (fences, paths, decorations).
    Decorative,
}

/// One placed entity: a name (drives recognition), a layer, the tile area
/// it occupies, and its live payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub layer: Layer,
    pub area: TileArea,
    pub payload: EntityPayload,
}

impl Entity {
    pub fn new(name: impl Into<String>, layer: Layer, area: TileArea, payload: EntityPayload) -> Self {
        Self {
            name: name.into(),
            layer,
            area,
            payload,
        }
    }
}

/// One location: a rectangular tile bound and an arena of placed entities.
#[derive(Debug)]
pub struct Location {
    key: LocationKey,
    width: u32,
    height: u32,
    entities: SlotMap<EntityId, Entity>,
    /// Insertion order, for deterministic scans.
    order: Vec<EntityId>,
}

impl Location {
    pub fn new(key: LocationKey, width: u32, height: u32) -> Self {
        Self {
            key,
            width,
            height,
            entities: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn key(&self) -> &LocationKey {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Enumerate every tile coordinate in this location, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> {
        let w = self.width as i32;
        let h = self.height as i32;
        (0..h).flat_map(move |y| (0..w).map(move |x| Tile::new(x, y)))
    }

    /// Place an entity. Overlap is allowed: a terrain feature and an object
    /// may share a tile.
    pub fn place(&mut self, entity: Entity) -> EntityId {
        let id = self.entities.insert(entity);
        self.order.push(id);
        id
    }

    /// Remove an entity, returning it if present.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id);
        if removed.is_some() {
            self.order.retain(|&e| e != id);
        }
        removed
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Iterate entities grouped by layer (scan order), insertion order
    /// within each layer.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        Layer::all().into_iter().flat_map(move |layer| {
            self.order.iter().filter_map(move |&id| {
                let e = self.entities.get(id)?;
                (e.layer == layer).then_some((id, e))
            })
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn inventory(&self, id: EntityId) -> Option<&Inventory> {
        match &self.entities.get(id)?.payload {
            EntityPayload::Inventory(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn inventory_mut(&mut self, id: EntityId) -> Option<&mut Inventory> {
        match &mut self.entities.get_mut(id)?.payload {
            EntityPayload::Inventory(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn machine_body(&self, id: EntityId) -> Option<&MachineBody> {
        match &self.entities.get(id)?.payload {
            EntityPayload::Machine(body) => Some(body),
            _ => None,
        }
    }

    pub fn machine_body_mut(&mut self, id: EntityId) -> Option<&mut MachineBody> {
        match &mut self.entities.get_mut(id)?.payload {
            EntityPayload::Machine(body) => Some(body),
            _ => None,
        }
    }
}

/// The full world: locations keyed by their location key.
#[derive(Debug, Default)]
pub struct World {
    locations: BTreeMap<LocationKey, Location>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&mut self, location: Location) {
        self.locations.insert(location.key().clone(), location);
    }

    pub fn remove_location(&mut self, key: &LocationKey) -> Option<Location> {
        self.locations.remove(key)
    }

    pub fn location(&self, key: &LocationKey) -> Option<&Location> {
        self.locations.get(key)
    }

    pub fn location_mut(&mut self, key: &LocationKey) -> Option<&mut Location> {
        self.locations.get_mut(key)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }
}
