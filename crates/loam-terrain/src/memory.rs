//! In-memory chunk store with lazy generation.

use hashbrown::HashMap;
use loam_spatial::{ChunkKey, ChunkSize};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{Chunk, ChunkState, ChunkStore, TerrainGenerator, Tile};

/// Chunk map plus the generator that fills it.
///
/// Mutation (generation, loading, unloading) happens only through `&mut
/// self`. Hot paths hold `&self` through [`ChunkStore`] and cannot
/// generate.
pub struct MemoryChunkStore {
    chunk_size: ChunkSize,
    chunks: HashMap<ChunkKey, Chunk>,
    generator: Box<dyn TerrainGenerator>,
    generation_runs: u64,
}

impl std::fmt::Debug for MemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChunkStore")
            .field("chunk_size", &self.chunk_size)
            .field("chunks", &self.chunks.len())
            .field("generation_runs", &self.generation_runs)
            .finish_non_exhaustive()
    }
}

impl MemoryChunkStore {
    pub fn new(chunk_size: ChunkSize, generator: impl TerrainGenerator + 'static) -> Self {
        Self {
            chunk_size,
            chunks: HashMap::new(),
            generator: Box::new(generator),
            generation_runs: 0,
        }
    }

    #[must_use]
    pub fn is_generated(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    #[must_use]
    pub fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }

    /// Runs the generator for `key` if the chunk does not exist yet.
    ///
    /// Returns `true` if generation ran.
    pub fn generate(&mut self, key: ChunkKey) -> bool {
        if self.chunks.contains_key(&key) {
            return false;
        }
        let chunk = self.generator.generate(key, self.chunk_size);
        self.chunks.insert(key, chunk);
        self.generation_runs += 1;
        debug!(chunk_x = key.x, chunk_y = key.y, "generated chunk");
        true
    }

    /// Tile read that generates the covering chunk on demand.
    ///
    /// Unbounded latency on a miss. Never call this from a per-entity loop;
    /// use [`crate::GenerationGuard`] there.
    pub fn tile_or_generate(&mut self, x: i32, y: i32) -> Tile {
        let key = self.chunk_size.key_of_tile(x, y);
        self.generate(key);
        self.tile_at(x, y)
    }

    /// Installs a chunk produced elsewhere, marking its coordinate
    /// generated.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the chunk's size differs from the store's.
    pub fn insert_chunk(&mut self, key: ChunkKey, chunk: Chunk) {
        debug_assert_eq!(chunk.size(), self.chunk_size);
        self.chunks.insert(key, chunk);
    }

    /// Generates every missing chunk in `keys`, in parallel.
    ///
    /// Returns the number of chunks generated.
    pub fn pregenerate(&mut self, keys: impl IntoIterator<Item = ChunkKey>) -> usize {
        let mut missing: Vec<ChunkKey> = keys
            .into_iter()
            .filter(|key| !self.chunks.contains_key(key))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let generator = &*self.generator;
        let size = self.chunk_size;
        let built: Vec<(ChunkKey, Chunk)> = missing
            .par_iter()
            .map(|&key| (key, generator.generate(key, size)))
            .collect();

        let count = built.len();
        self.generation_runs += count as u64;
        self.chunks.extend(built);
        info!(count, total = self.chunks.len(), "pregenerated chunks");
        count
    }

    /// Drops a generated chunk; it reads as ungenerated afterwards.
    pub fn unload(&mut self, key: ChunkKey) -> bool {
        self.chunks.remove(&key).is_some()
    }

    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.chunks.len()
    }

    /// How many chunks the generator has produced over the store's life.
    #[must_use]
    pub const fn generation_runs(&self) -> u64 {
        self.generation_runs
    }
}

impl ChunkStore for MemoryChunkStore {
    fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    fn chunk_state_at(&self, key: ChunkKey) -> ChunkState {
        if self.chunks.contains_key(&key) {
            ChunkState::GENERATED
        } else {
            ChunkState::UNGENERATED
        }
    }

    fn tile_at(&self, x: i32, y: i32) -> Tile {
        let key = self.chunk_size.key_of_tile(x, y);
        self.chunks
            .get(&key)
            .map_or(Tile::VOID, |chunk| chunk.tile(x, y))
    }
}
