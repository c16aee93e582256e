//! Procedural generator contract.

use loam_spatial::{ChunkKey, ChunkSize};

use crate::{Chunk, Tile, TileKind};

/// Produces terrain for chunk coordinates.
///
/// Must be deterministic: the same coordinate always yields the same tile,
/// so chunks can be unloaded and generated again.
pub trait TerrainGenerator: Send + Sync {
    fn tile(&self, x: i64, y: i64) -> Tile;

    fn generate(&self, key: ChunkKey, size: ChunkSize) -> Chunk {
        Chunk::from_fn(size, key, |x, y| self.tile(x, y))
    }
}

/// Uniform terrain, handy in tests.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain(pub TileKind);

impl TerrainGenerator for FlatTerrain {
    fn tile(&self, _x: i64, _y: i64) -> Tile {
        Tile::new(self.0, 0)
    }
}
