//! The aggregate group: a logical, non-spatial union of machine groups
//! that share the universal-link container type.
//!
//! Members are added and removed as locations reload. Every mutation bumps
//! a generation counter; the merged view is recomputed lazily when queried
//! at a stale generation, so a stale merge can never be observed. An
//! explicit [`AggregateGroup::rebuild`] remains for eager callers.

use crate::container::ContainerRef;
use crate::group::MachineGroup;
use crate::machine::MachineInstance;
use crate::tile::Tile;
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct AggregateGroup {
    members: Vec<MachineGroup>,
    generation: u64,
    /// Generation the merged view was built at. Starts behind
    /// `generation`, so the first query builds.
    merged_generation: u64,
    merged: MachineGroup,
}

impl AggregateGroup {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            generation: 1,
            merged_generation: 0,
            merged: MachineGroup::merged(BTreeSet::new(), Vec::new(), Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[MachineGroup] {
        &self.members
    }

    /// Current mutation generation; bumped on every add/remove.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Add member groups. Each must hold at least one universal-link
    /// container (callers partition on that flag).
    pub fn add(&mut self, groups: impl IntoIterator<Item = MachineGroup>) {
        let before = self.members.len();
        self.members.extend(groups);
        if self.members.len() != before {
            self.generation += 1;
        }
    }

    /// Remove all members matching the predicate. Returns how many were
    /// removed.
    pub fn remove_where(&mut self, predicate: impl Fn(&MachineGroup) -> bool) -> usize {
        let before = self.members.len();
        self.members.retain(|g| !predicate(g));
        let removed = before - self.members.len();
        if removed > 0 {
            self.generation += 1;
        }
        removed
    }

    /// Force the merged view up to date.
    pub fn rebuild(&mut self) {
        self.merged = self.compute_merged();
        self.merged_generation = self.generation;
    }

    /// The merged view, recomputed first if any mutation happened since it
    /// was last built.
    pub fn merged(&mut self) -> &MachineGroup {
        if self.merged_generation != self.generation {
            self.rebuild();
        }
        &self.merged
    }

    /// The merged view, if it is current. The engine rebuilds after every
    /// mutation, so `None` here means a missed rebuild upstream.
    pub(crate) fn merged_view(&self) -> Option<&MachineGroup> {
        (self.merged_generation == self.generation).then_some(&self.merged)
    }

    /// Merge member lists: machines concatenated then re-sorted by kind
    /// priority (stable, so discovery order breaks ties); exactly one
    /// representative of the universal-link container type retained; all
    /// other containers kept as-is; tiles unioned (informational only —
    /// the group is not spatially contiguous).
    fn compute_merged(&self) -> MachineGroup {
        let mut machines: Vec<MachineInstance> = Vec::new();
        let mut containers: Vec<ContainerRef> = Vec::new();
        let mut tiles: BTreeSet<Tile> = BTreeSet::new();
        let mut link_seen = false;

        for member in &self.members {
            machines.extend(member.machines().iter().cloned());
            for container in member.containers() {
                if container.flags.shared_link {
                    if link_seen {
                        continue;
                    }
                    link_seen = true;
                }
                containers.push(container.clone());
            }
            tiles.extend(member.tiles().iter().copied());
        }

        machines.sort_by_key(|m| m.kind.priority());

        MachineGroup::merged(tiles, machines, containers)
    }
}

impl Default for AggregateGroup {
    fn default() -> Self {
        Self::new()
    }
}
