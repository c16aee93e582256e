//! Chunk coordinates.
//!
//! ```text
//!   world x:  -64      -32       0        32       64
//!              ├────────┼────────┼────────┼────────┤
//!   chunk x:      -2       -1        0        1
//! ```
//!
//! Mapping is floor division, so negative coordinates land in negative
//! chunks and each chunk covers `[k·s, (k+1)·s)` on both axes.

use std::fmt;

use loam_entity::Position;

use crate::{SpatialError, SpatialResult};

/// Integer coordinate of a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
}

impl ChunkKey {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Ring distance: number of chunk steps including diagonals.
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        if dx > dy { dx as u32 } else { dy as u32 }
    }

    /// Keys at exactly `distance` chunk steps from `self`.
    ///
    /// `ring(0)` is just `self`. Keys outside the `i32` range are skipped.
    pub fn ring(self, distance: u32) -> impl Iterator<Item = ChunkKey> {
        let cx = i64::from(self.x);
        let cy = i64::from(self.y);
        let d = i64::from(distance);

        let rows = if d == 0 { vec![cy] } else { vec![cy - d, cy + d] };
        let edges = rows
            .into_iter()
            .flat_map(move |y| (cx - d..=cx + d).map(move |x| (x, y)));
        let sides = (cy - d + 1..cy + d)
            .flat_map(move |y| [(cx - d, y), (cx + d, y)]);

        edges.chain(sides).filter_map(|(x, y)| {
            Some(ChunkKey::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
        })
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chunk edge length in tiles.
///
/// Fixed for the lifetime of a world; the index and the terrain store must
/// agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkSize(u32);

impl ChunkSize {
    pub const DEFAULT_TILES: u32 = 32;

    pub const fn new(tiles: u32) -> SpatialResult<Self> {
        if tiles == 0 {
            return Err(SpatialError::InvalidChunkSize(tiles));
        }
        Ok(Self(tiles))
    }

    #[must_use]
    pub const fn tiles(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn world_units(self) -> f64 {
        self.0 as f64
    }

    /// Chunk containing `position`.
    ///
    /// `None` for non-finite positions and for positions whose chunk
    /// coordinate does not fit in `i32`.
    #[must_use]
    pub fn key_of(self, position: Position) -> Option<ChunkKey> {
        if !position.is_finite() {
            return None;
        }
        let size = self.world_units();
        Some(ChunkKey::new(
            floor_to_i32(position.x / size)?,
            floor_to_i32(position.y / size)?,
        ))
    }

    /// Chunk containing the tile at integer coordinates.
    #[must_use]
    pub const fn key_of_tile(self, x: i32, y: i32) -> ChunkKey {
        let size = self.0 as i64;
        ChunkKey::new(
            (x as i64).div_euclid(size) as i32,
            (y as i64).div_euclid(size) as i32,
        )
    }

    /// Tile offset inside its chunk, row-major index into a chunk's tiles.
    #[must_use]
    pub const fn local_index(self, x: i32, y: i32) -> usize {
        let size = self.0 as i64;
        let lx = (x as i64).rem_euclid(size) as usize;
        let ly = (y as i64).rem_euclid(size) as usize;
        ly * self.0 as usize + lx
    }

    /// World-space corner of a chunk (its minimum x and y).
    #[must_use]
    pub fn origin(self, key: ChunkKey) -> Position {
        let size = self.world_units();
        Position::new(f64::from(key.x) * size, f64::from(key.y) * size)
    }

    /// Number of chunk widths a radius spans: `ceil(radius / size)`.
    #[must_use]
    pub fn span(self, radius: f64) -> u64 {
        let chunks = (radius / self.world_units()).ceil();
        if chunks >= u32::MAX as f64 {
            u64::from(u32::MAX)
        } else {
            chunks as u64
        }
    }

    /// Square window of chunks a radius query around `center` must visit.
    #[must_use]
    pub fn window(self, center: ChunkKey, radius: f64) -> ChunkWindow {
        ChunkWindow::around(center, self.span(radius))
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT_TILES)
    }
}

fn floor_to_i32(value: f64) -> Option<i32> {
    let floored = value.floor();
    if floored < f64::from(i32::MIN) || floored > f64::from(i32::MAX) {
        return None;
    }
    Some(floored as i32)
}

/// Inclusive square `[cx-span, cx+span] × [cy-span, cy+span]` of chunk keys.
///
/// Bounds are kept in `i64` so windows touching the edge of the `i32` range
/// do not overflow; iteration skips keys outside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkWindow {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl ChunkWindow {
    #[must_use]
    pub fn around(center: ChunkKey, span: u64) -> Self {
        let span = span as i64;
        Self {
            min_x: i64::from(center.x) - span,
            max_x: i64::from(center.x) + span,
            min_y: i64::from(center.y) - span,
            max_y: i64::from(center.y) + span,
        }
    }

    #[must_use]
    pub const fn contains(&self, key: ChunkKey) -> bool {
        let x = key.x as i64;
        let y = key.y as i64;
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Number of chunk keys in the window.
    #[must_use]
    pub const fn area(&self) -> u128 {
        let width = (self.max_x - self.min_x + 1) as u128;
        let height = (self.max_y - self.min_y + 1) as u128;
        width * height
    }

    pub fn keys(self) -> impl Iterator<Item = ChunkKey> {
        let min_x = self.min_x.max(i64::from(i32::MIN));
        let max_x = self.max_x.min(i64::from(i32::MAX));
        let min_y = self.min_y.max(i64::from(i32::MIN));
        let max_y = self.max_y.min(i64::from(i32::MAX));

        (min_y..=max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| ChunkKey::new(x as i32, y as i32)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> ChunkSize {
        ChunkSize::new(32).unwrap()
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert_eq!(ChunkSize::new(0), Err(SpatialError::InvalidChunkSize(0)));
    }

    #[test]
    fn position_to_chunk() {
        let s = size();

        assert_eq!(s.key_of(Position::new(0.0, 0.0)), Some(ChunkKey::new(0, 0)));
        assert_eq!(s.key_of(Position::new(31.9, 5.0)), Some(ChunkKey::new(0, 0)));
        assert_eq!(s.key_of(Position::new(32.0, 0.0)), Some(ChunkKey::new(1, 0)));
        assert_eq!(s.key_of(Position::new(40.0, 40.0)), Some(ChunkKey::new(1, 1)));
        assert_eq!(
            s.key_of(Position::new(-0.1, -32.0)),
            Some(ChunkKey::new(-1, -1))
        );
        assert_eq!(
            s.key_of(Position::new(-32.1, 0.0)),
            Some(ChunkKey::new(-2, 0))
        );
    }

    #[test]
    fn invalid_positions_have_no_chunk() {
        let s = size();

        assert_eq!(s.key_of(Position::new(f64::NAN, 0.0)), None);
        assert_eq!(s.key_of(Position::new(0.0, f64::NEG_INFINITY)), None);
        assert_eq!(s.key_of(Position::new(1e300, 0.0)), None);
    }

    #[test]
    fn tile_to_chunk_matches_position_to_chunk() {
        let s = size();

        for x in [-65, -64, -33, -32, -1, 0, 1, 31, 32, 63, 64] {
            let by_tile = s.key_of_tile(x, 0);
            let by_pos = s.key_of(Position::new(f64::from(x) + 0.5, 0.5)).unwrap();
            assert_eq!(by_tile, by_pos, "tile {x}");
        }
    }

    #[test]
    fn local_index_is_row_major() {
        let s = size();

        assert_eq!(s.local_index(0, 0), 0);
        assert_eq!(s.local_index(1, 0), 1);
        assert_eq!(s.local_index(0, 1), 32);
        assert_eq!(s.local_index(-1, -1), 32 * 32 - 1);
    }

    #[test]
    fn span_rounds_up() {
        let s = size();

        assert_eq!(s.span(0.0), 0);
        assert_eq!(s.span(10.0), 1);
        assert_eq!(s.span(32.0), 1);
        assert_eq!(s.span(32.5), 2);
        assert_eq!(s.span(f64::MAX), u64::from(u32::MAX));
    }

    #[test]
    fn window_keys_cover_square() {
        let window = ChunkWindow::around(ChunkKey::new(2, -1), 1);
        let keys: Vec<_> = window.keys().collect();

        assert_eq!(window.area(), 9);
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&ChunkKey::new(1, -2)));
        assert!(keys.contains(&ChunkKey::new(3, 0)));
        assert!(window.contains(ChunkKey::new(3, 0)));
        assert!(!window.contains(ChunkKey::new(4, 0)));
    }

    #[test]
    fn rings_partition_the_window() {
        let center = ChunkKey::new(-3, 5);
        let mut seen: Vec<ChunkKey> = (0..=3).flat_map(|d| center.ring(d)).collect();
        seen.sort();

        let mut expected: Vec<_> = ChunkWindow::around(center, 3).keys().collect();
        expected.sort();

        assert_eq!(seen, expected);
        assert!(center.ring(2).all(|key| key.chebyshev(center) == 2));
        assert_eq!(center.ring(0).collect::<Vec<_>>(), vec![center]);
    }

    #[test]
    fn window_at_range_edge_does_not_overflow() {
        let window = ChunkWindow::around(ChunkKey::new(i32::MAX, i32::MIN), 1);

        assert_eq!(window.keys().count(), 4);
        assert_eq!(ChunkKey::new(i32::MAX, 0).ring(1).count(), 5);
    }
}
