//! Tile storage backing the world, and the guard that keeps hot loops from
//! generating it.
//!
//! Terrain is produced chunk by chunk. Reading a tile through
//! [`MemoryChunkStore::tile_or_generate`] may run the generator for a whole
//! chunk, which is far too slow to do per entity per tick. Systems that read
//! tiles in a loop go through [`GenerationGuard`] instead, which only serves
//! tiles from chunks that already exist.

mod chunk;
mod config;
mod generator;
mod guard;
mod memory;
mod noise;
mod tile;

pub use chunk::{Chunk, ChunkState, ChunkStore};
pub use config::TerrainConfig;
pub use generator::{FlatTerrain, TerrainGenerator};
pub use guard::{GenerationGuard, GuardStats, tile_coords};
pub use memory::MemoryChunkStore;
pub use noise::NoiseTerrain;
pub use tile::{Tile, TileKind};

pub mod prelude {
    pub use crate::{ChunkStore, GenerationGuard, MemoryChunkStore, Tile, TileKind};
}
