//! Chunk tile grids and the read-only store contract.

use loam_spatial::{ChunkKey, ChunkSize};

use crate::Tile;

/// Generation status of one chunk coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkState {
    pub generated: bool,
}

impl ChunkState {
    pub const UNGENERATED: Self = Self { generated: false };
    pub const GENERATED: Self = Self { generated: true };
}

/// Read side of a chunked tile store.
///
/// Every method takes `&self`: nothing reachable through this trait can
/// run terrain generation.
pub trait ChunkStore {
    fn chunk_size(&self) -> ChunkSize;

    fn chunk_state_at(&self, key: ChunkKey) -> ChunkState;

    /// Tile at integer world coordinates.
    ///
    /// Only meaningful when the covering chunk is generated; reads
    /// [`Tile::VOID`] otherwise.
    fn tile_at(&self, x: i32, y: i32) -> Tile;
}

/// Square grid of tiles, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    size: ChunkSize,
    tiles: Box<[Tile]>,
}

impl Chunk {
    /// A chunk with every tile set to `tile`.
    #[must_use]
    pub fn filled(size: ChunkSize, tile: Tile) -> Self {
        let side = size.tiles() as usize;
        Self {
            size,
            tiles: vec![tile; side * side].into_boxed_slice(),
        }
    }

    /// Builds the chunk at `key`, asking `f` for each tile by world
    /// coordinate.
    pub fn from_fn(size: ChunkSize, key: ChunkKey, mut f: impl FnMut(i64, i64) -> Tile) -> Self {
        let side = i64::from(size.tiles());
        let origin_x = i64::from(key.x) * side;
        let origin_y = i64::from(key.y) * side;

        let tiles = (0..side)
            .flat_map(|ly| (0..side).map(move |lx| (lx, ly)))
            .map(|(lx, ly)| f(origin_x + lx, origin_y + ly))
            .collect();

        Self { size, tiles }
    }

    #[must_use]
    pub const fn size(&self) -> ChunkSize {
        self.size
    }

    /// Tile at world coordinates, which must fall inside this chunk.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Tile {
        self.tiles
            .get(self.size.local_index(x, y))
            .copied()
            .unwrap_or(Tile::VOID)
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        let index = self.size.local_index(x, y);
        if let Some(slot) = self.tiles.get_mut(index) {
            *slot = tile;
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.iter().copied()
    }
}
