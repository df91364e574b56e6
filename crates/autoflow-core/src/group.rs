//! Machine groups: one connected component of machines, containers, and
//! connectors, treated as a single automation unit.

use crate::container::ContainerRef;
use crate::id::LocationKey;
use crate::machine::MachineInstance;
use crate::storage::StorageAllocator;
use crate::tick::{self, GroupTickSummary, TickContext};
use crate::tile::Tile;
use std::collections::BTreeSet;

/// One automation unit. Ordinary groups are one 4-connected component in
/// one location; the aggregate group's merged view spans locations and has
/// no location key of its own.
#[derive(Debug)]
pub struct MachineGroup {
    location: Option<LocationKey>,
    tiles: BTreeSet<Tile>,
    machines: Vec<MachineInstance>,
    containers: Vec<ContainerRef>,
    aggregate: bool,
}

impl MachineGroup {
    pub(crate) fn new(
        location: LocationKey,
        tiles: BTreeSet<Tile>,
        machines: Vec<MachineInstance>,
        containers: Vec<ContainerRef>,
    ) -> Self {
        Self {
            location: Some(location),
            tiles,
            machines,
            containers,
            aggregate: false,
        }
    }

    /// The aggregate group's merged view. Tiles are informational only —
    /// the group is not spatially contiguous.
    pub(crate) fn merged(
        tiles: BTreeSet<Tile>,
        machines: Vec<MachineInstance>,
        containers: Vec<ContainerRef>,
    ) -> Self {
        Self {
            location: None,
            tiles,
            machines,
            containers,
            aggregate: true,
        }
    }

    /// The originating location, or `None` for the aggregate group.
    pub fn location(&self) -> Option<&LocationKey> {
        self.location.as_ref()
    }

    pub fn tiles(&self) -> &BTreeSet<Tile> {
        &self.tiles
    }

    pub fn machines(&self) -> &[MachineInstance] {
        &self.machines
    }

    pub fn containers(&self) -> &[ContainerRef] {
        &self.containers
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    /// Whether this group can do useful work on its own: at least one
    /// machine and at least one container other than the universal-link
    /// type. The aggregate group's storage is shared by construction, so
    /// any machine suffices there.
    pub fn has_internal_automation(&self) -> bool {
        if self.aggregate {
            return !self.machines.is_empty();
        }
        !self.machines.is_empty() && self.containers.iter().any(|c| !c.flags.shared_link)
    }

    /// The allocator over this group's ordered container list.
    pub fn storage(&self) -> StorageAllocator<'_> {
        StorageAllocator::new(&self.containers)
    }

    /// Run one automation tick for this group. Faults are isolated per
    /// machine; see [`tick::automate_group`].
    pub fn automate(&self, ctx: &mut TickContext<'_>) -> GroupTickSummary {
        tick::automate_group(self, ctx)
    }
}
