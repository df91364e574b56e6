//! Tile coordinates and rectangular tile areas.
//!
//! A [`Tile`] is the unit of spatial adjacency; a [`TileArea`] is the
//! rectangle of tiles an entity occupies. Adjacency is 4-connected: two
//! tiles are adjacent when they share an edge, never just a corner.

use serde::{Deserialize, Serialize};

/// An integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    pub fn manhattan_distance(&self, other: &Tile) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// The four edge-adjacent neighbors.
    pub fn adjacent(&self) -> [Tile; 4] {
        [
            Tile::new(self.x, self.y - 1),
            Tile::new(self.x + 1, self.y),
            Tile::new(self.x, self.y + 1),
            Tile::new(self.x - 1, self.y),
        ]
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The rectangular set of tiles an entity occupies. Origin is the top-left
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileArea {
    pub origin: Tile,
    pub width: u32,
    pub height: u32,
}

impl TileArea {
    pub fn new(origin: Tile, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// A 1x1 area.
    pub fn single(tile: Tile) -> Self {
        Self::new(tile, 1, 1)
    }

    /// Check whether a tile falls inside this area.
    pub fn contains(&self, tile: Tile) -> bool {
        tile.x >= self.origin.x
            && tile.x < self.origin.x + self.width as i32
            && tile.y >= self.origin.y
            && tile.y < self.origin.y + self.height as i32
    }

    /// Check whether two areas overlap.
    pub fn intersects(&self, other: &TileArea) -> bool {
        self.origin.x < other.origin.x + other.width as i32
            && other.origin.x < self.origin.x + self.width as i32
            && self.origin.y < other.origin.y + other.height as i32
            && other.origin.y < self.origin.y + self.height as i32
    }

    /// Iterate over all tiles in this area, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> {
        let w = self.width as i32;
        let h = self.height as i32;
        let ox = self.origin.x;
        let oy = self.origin.y;
        (0..h).flat_map(move |dy| (0..w).map(move |dx| Tile::new(ox + dx, oy + dy)))
    }

    /// Iterate over the tiles edge-adjacent to this area's bounding
    /// rectangle: the rows directly above and below, and the columns
    /// directly left and right. Corner tiles are excluded (adjacency is
    /// 4-connected).
    pub fn surrounding(&self) -> impl Iterator<Item = Tile> {
        let w = self.width as i32;
        let h = self.height as i32;
        let ox = self.origin.x;
        let oy = self.origin.y;
        let above = (0..w).map(move |dx| Tile::new(ox + dx, oy - 1));
        let below = (0..w).map(move |dx| Tile::new(ox + dx, oy + h));
        let left = (0..h).map(move |dy| Tile::new(ox - 1, oy + dy));
        let right = (0..h).map(move |dy| Tile::new(ox + w, oy + dy));
        above.chain(below).chain(left).chain(right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn single_area_tiles() {
        let area = TileArea::single(Tile::new(3, 4));
        let tiles: Vec<Tile> = area.tiles().collect();
        assert_eq!(tiles, vec![Tile::new(3, 4)]);
    }

    #[test]
    fn area_tiles_row_major() {
        let area = TileArea::new(Tile::new(0, 0), 2, 2);
        let tiles: Vec<Tile> = area.tiles().collect();
        assert_eq!(
            tiles,
            vec![
                Tile::new(0, 0),
                Tile::new(1, 0),
                Tile::new(0, 1),
                Tile::new(1, 1),
            ]
        );
    }

    #[test]
    fn contains_and_intersects() {
        let area = TileArea::new(Tile::new(1, 1), 2, 3);
        assert!(area.contains(Tile::new(1, 1)));
        assert!(area.contains(Tile::new(2, 3)));
        assert!(!area.contains(Tile::new(3, 1)));
        assert!(!area.contains(Tile::new(0, 1)));

        let other = TileArea::new(Tile::new(2, 3), 2, 2);
        assert!(area.intersects(&other));
        let far = TileArea::new(Tile::new(10, 10), 1, 1);
        assert!(!area.intersects(&far));
    }

    #[test]
    fn surrounding_excludes_corners() {
        let area = TileArea::new(Tile::new(5, 5), 2, 1);
        let ring: BTreeSet<Tile> = area.surrounding().collect();
        let expected: BTreeSet<Tile> = [
            Tile::new(5, 4),
            Tile::new(6, 4),
            Tile::new(5, 6),
            Tile::new(6, 6),
            Tile::new(4, 5),
            Tile::new(7, 5),
        ]
        .into_iter()
        .collect();
        assert_eq!(ring, expected);
        // Corners such as (4, 4) are not adjacent.
        assert!(!ring.contains(&Tile::new(4, 4)));
    }

    #[test]
    fn surrounding_count_matches_perimeter() {
        let area = TileArea::new(Tile::new(0, 0), 3, 2);
        assert_eq!(area.surrounding().count(), 2 * 3 + 2 * 2);
    }

    #[test]
    fn adjacent_tiles() {
        let t = Tile::new(0, 0);
        let neighbors: BTreeSet<Tile> = t.adjacent().into_iter().collect();
        assert_eq!(neighbors.len(), 4);
        assert!(neighbors.contains(&Tile::new(0, -1)));
        assert!(neighbors.contains(&Tile::new(-1, 0)));
    }
}
