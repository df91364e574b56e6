//! Tile→entities lookup for one location.

use crate::id::EntityId;
use crate::tile::Tile;
use crate::world::Location;
use std::collections::BTreeMap;

/// A tile→list-of-entities lookup, built by scanning one location's entity
/// collections once. A tile may hold several overlapping entities (e.g. a
/// terrain feature under an object); the list preserves layer order, then
/// insertion order.
///
/// Built fresh per reload; never incrementally maintained. O(entities) to
/// build, O(1) amortized per-tile lookup.
#[derive(Debug, Default)]
pub struct WorldIndex {
    by_tile: BTreeMap<Tile, Vec<EntityId>>,
}

impl WorldIndex {
    pub fn build(location: &Location) -> Self {
        let mut by_tile: BTreeMap<Tile, Vec<EntityId>> = BTreeMap::new();
        for (id, entity) in location.entities() {
            for tile in entity.area.tiles() {
                by_tile.entry(tile).or_default().push(id);
            }
        }
        Self { by_tile }
    }

    /// Entities occupying a tile, layer order preserved. Empty when the
    /// tile is bare.
    pub fn entities_at(&self, tile: Tile) -> &[EntityId] {
        self.by_tile.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of occupied tiles.
    pub fn occupied_tiles(&self) -> usize {
        self.by_tile.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LocationKey;
    use crate::item::Inventory;
    use crate::tile::TileArea;
    use crate::world::{Entity, EntityPayload, Layer, Location};

    #[test]
    fn multi_tile_entity_indexed_on_every_tile() {
        let mut loc = Location::new(LocationKey::new("farm"), 8, 8);
        let id = loc.place(Entity::new(
            "mill",
            Layer::Building,
            TileArea::new(Tile::new(2, 2), 2, 2),
            EntityPayload::Decorative,
        ));
        let index = WorldIndex::build(&loc);
        assert_eq!(index.occupied_tiles(), 4);
        for tile in [Tile::new(2, 2), Tile::new(3, 3)] {
            assert_eq!(index.entities_at(tile), &[id]);
        }
        assert!(index.entities_at(Tile::new(4, 4)).is_empty());
    }

    #[test]
    fn overlapping_entities_keep_layer_order() {
        let mut loc = Location::new(LocationKey::new("farm"), 8, 8);
        // Inserted terrain-first, but objects scan first.
        let path = loc.place(Entity::new(
            "path",
            Layer::TerrainFeature,
            TileArea::single(Tile::new(1, 1)),
            EntityPayload::Decorative,
        ));
        let chest = loc.place(Entity::new(
            "crate",
            Layer::Object,
            TileArea::single(Tile::new(1, 1)),
            EntityPayload::Inventory(Inventory::new(10)),
        ));
        let index = WorldIndex::build(&loc);
        assert_eq!(index.entities_at(Tile::new(1, 1)), &[chest, path]);
    }
}
