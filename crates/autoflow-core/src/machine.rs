//! Machine behavior and runtime state.
//!
//! Behavior and state are split: a [`MachineKind`] is a stateless trait
//! object shared by every instance of that kind, while the mutable
//! [`MachineBody`] lives in the world entity. A [`MachineInstance`] ties a
//! kind to one placed entity and carries the stable [`MachineKey`] used by
//! the pause table.

use crate::error::MachineError;
use crate::id::{EntityId, LocationKey, Ticks};
use crate::item::ItemStack;
use crate::storage::StorageAllocator;
use crate::tile::{Tile, TileArea};
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// Observable processing state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineState {
    /// Idle, ready to accept input.
    Empty,
    /// Mid-cycle; skipped by automation until the countdown elapses.
    Processing,
    /// Holding finished output, ready to be collected.
    Done,
}

/// The machine's current cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStage {
    #[default]
    Idle,
    /// A cycle is underway: the output it will yield and the tick at which
    /// it becomes collectible.
    Working { ready_at: Ticks, output: ItemStack },
}

/// Generic machine runtime state, stored in the world entity so it
/// survives group reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineBody {
    pub stage: MachineStage,
}

impl MachineBody {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn state(&self, now: Ticks) -> MachineState {
        match &self.stage {
            MachineStage::Idle => MachineState::Empty,
            MachineStage::Working { ready_at, .. } => {
                if now >= *ready_at {
                    MachineState::Done
                } else {
                    MachineState::Processing
                }
            }
        }
    }

    /// Begin a cycle that yields `output` at `ready_at`.
    pub fn start(&mut self, output: ItemStack, ready_at: Ticks) {
        self.stage = MachineStage::Working { ready_at, output };
    }

    /// The finished output, if the countdown has elapsed.
    pub fn pending_output(&self, now: Ticks) -> Option<&ItemStack> {
        match &self.stage {
            MachineStage::Working { ready_at, output } if now >= *ready_at => Some(output),
            _ => None,
        }
    }

    /// Reduce the pending output by `taken` units; the machine resets to
    /// idle once the stack drains.
    pub fn reduce_output(&mut self, taken: u32) {
        if let MachineStage::Working { output, .. } = &mut self.stage {
            output.quantity = output.quantity.saturating_sub(taken);
            if output.quantity == 0 {
                self.stage = MachineStage::Idle;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MachineKey
// ---------------------------------------------------------------------------

/// Stable composite key for one machine instance: location + area origin +
/// kind id. Assigned at creation; never derived from reference identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineKey {
    pub location: LocationKey,
    pub origin: Tile,
    pub kind: String,
}

impl std::fmt::Display for MachineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.kind, self.location, self.origin)
    }
}

// ---------------------------------------------------------------------------
// MachineKind
// ---------------------------------------------------------------------------

/// One machine behavior. Implementations are stateless: all mutable state
/// goes through the entity's [`MachineBody`].
///
/// The default `state` / `output` / `output_taken` read and write the body
/// directly, so most kinds only implement [`MachineKind::id`] and
/// [`MachineKind::set_input`].
pub trait MachineKind: std::fmt::Debug + Send + Sync {
    /// Stable identifier, identical for two instances with identical
    /// behavior and recipes.
    fn id(&self) -> &str;

    /// Sort priority in the aggregate group's merged machine list. Lower
    /// runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether every instance of this kind fails `set_input` identically
    /// against the same storage snapshot. Kinds with per-instance recipe
    /// overrides must return false to opt out of the per-tick
    /// exhausted-kind short circuit.
    fn shares_recipes_across_instances(&self) -> bool {
        true
    }

    fn state(&self, world: &World, machine: &MachineInstance, now: Ticks) -> MachineState {
        machine
            .body(world)
            .map(|body| body.state(now))
            .unwrap_or(MachineState::Empty)
    }

    /// Side-effect-free peek at the finished output.
    fn output(
        &self,
        world: &World,
        machine: &MachineInstance,
        now: Ticks,
    ) -> Result<ItemStack, MachineError> {
        let body = machine.body(world).ok_or(MachineError::MissingEntity)?;
        body.pending_output(now)
            .copied()
            .ok_or(MachineError::NoOutput)
    }

    /// Confirm that `taken` units of the pending output were stored. Resets
    /// the machine once the pending stack drains. Never called before
    /// storage confirmed the units.
    fn output_taken(
        &self,
        world: &mut World,
        machine: &MachineInstance,
        taken: u32,
    ) -> Result<(), MachineError> {
        let body = machine.body_mut(world).ok_or(MachineError::MissingEntity)?;
        body.reduce_output(taken);
        Ok(())
    }

    /// Try to begin a new cycle by pulling ingredients from the group's
    /// storage. `Ok(false)` is a soft skip (no matching recipe or
    /// ingredients this tick), not an error.
    fn set_input(
        &self,
        world: &mut World,
        machine: &MachineInstance,
        storage: &StorageAllocator<'_>,
        now: Ticks,
    ) -> Result<bool, MachineError>;
}

// ---------------------------------------------------------------------------
// MachineInstance
// ---------------------------------------------------------------------------

/// One machine in one group: a kind bound to a placed entity.
#[derive(Debug, Clone)]
pub struct MachineInstance {
    pub entity: EntityId,
    pub location: LocationKey,
    pub area: TileArea,
    pub kind: Arc<dyn MachineKind>,
    pub key: MachineKey,
}

impl MachineInstance {
    pub fn new(
        kind: Arc<dyn MachineKind>,
        location: LocationKey,
        entity: EntityId,
        area: TileArea,
    ) -> Self {
        let key = MachineKey {
            location: location.clone(),
            origin: area.origin,
            kind: kind.id().to_string(),
        };
        Self {
            entity,
            location,
            area,
            kind,
            key,
        }
    }

    pub fn state(&self, world: &World, now: Ticks) -> MachineState {
        self.kind.state(world, self, now)
    }

    pub fn body<'w>(&self, world: &'w World) -> Option<&'w MachineBody> {
        world.location(&self.location)?.machine_body(self.entity)
    }

    pub fn body_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut MachineBody> {
        world
            .location_mut(&self.location)?
            .machine_body_mut(self.entity)
    }
}
