//! Flood-fill discovery of machine groups.
//!
//! One location's tiles are partitioned into disjoint connected components
//! of machines, containers, and connectors. Adjacency is 4-connected over
//! each entity's full tile-area bounding rectangle; a tile that classifies
//! to nothing is a hard boundary.
//!
//! The resulting partition is independent of which tile within a component
//! seeds the fill and of the tile enumeration order: every tile of a
//! component reaches every other through classified tiles, so the same
//! component is produced whichever tile is visited first.

use crate::classify::{Classifier, Recognized};
use crate::container::ContainerRef;
use crate::group::MachineGroup;
use crate::id::EntityId;
use crate::index::WorldIndex;
use crate::machine::MachineInstance;
use crate::tile::Tile;
use crate::world::Location;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Scan one location into its machine groups. O(tiles in location).
///
/// Groups are emitted in scan order (row-major by seed tile); members are
/// listed in discovery order. Connector-only patches carry no machines or
/// containers and are dropped.
pub fn scan_location(classifier: &Classifier, location: &Location) -> Vec<MachineGroup> {
    let index = WorldIndex::build(location);
    let mut visited: BTreeSet<Tile> = BTreeSet::new();
    let mut groups = Vec::new();

    for seed in location.tiles() {
        if visited.contains(&seed) {
            continue;
        }
        if let Some(group) = flood_fill(classifier, location, &index, seed, &mut visited) {
            groups.push(group);
        }
    }

    groups
}

/// Breadth-first fill from one seed tile. Returns the discovered group, or
/// `None` when the seed classifies to nothing (it is marked visited either
/// way).
fn flood_fill(
    classifier: &Classifier,
    location: &Location,
    index: &WorldIndex,
    seed: Tile,
    visited: &mut BTreeSet<Tile>,
) -> Option<MachineGroup> {
    let mut tiles: BTreeSet<Tile> = BTreeSet::new();
    let mut machines: Vec<MachineInstance> = Vec::new();
    let mut containers: Vec<ContainerRef> = Vec::new();
    let mut consumed: HashSet<EntityId> = HashSet::new();
    let mut queue: VecDeque<Tile> = VecDeque::new();
    queue.push_back(seed);

    while let Some(tile) = queue.pop_front() {
        if visited.contains(&tile) {
            continue;
        }
        let Some((id, recognized)) = classifier.classify(location, index, tile) else {
            // Hard boundary: nothing automatable here.
            visited.insert(tile);
            continue;
        };
        if consumed.contains(&id) {
            visited.insert(tile);
            continue;
        }
        consumed.insert(id);

        // Consume the entity's whole tile-area and fan out from the
        // tiles adjacent to its bounding rectangle.
        let area = match &recognized {
            Recognized::Machine(m) => m.area,
            Recognized::Container(c) => c.area,
            Recognized::Connector => match location.entity(id) {
                Some(e) => e.area,
                None => {
                    visited.insert(tile);
                    continue;
                }
            },
        };
        for t in area.tiles() {
            visited.insert(t);
            tiles.insert(t);
        }
        for t in area.surrounding() {
            if !visited.contains(&t) {
                queue.push_back(t);
            }
        }

        match recognized {
            Recognized::Machine(m) => machines.push(m),
            Recognized::Container(c) => containers.push(c),
            Recognized::Connector => {}
        }
    }

    if machines.is_empty() && containers.is_empty() {
        return None;
    }
    Some(MachineGroup::new(
        location.key().clone(),
        tiles,
        machines,
        containers,
    ))
}
