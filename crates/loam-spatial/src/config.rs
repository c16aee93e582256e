//! Index configuration.

use serde::Deserialize;

use crate::{ChunkSize, SpatialResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Chunk edge length in tiles. Shared with the terrain store.
    pub chunk_size: u32,
    /// Drop buckets as soon as their last resident leaves.
    pub prune_empty_buckets: bool,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::DEFAULT_TILES,
            prune_empty_buckets: true,
        }
    }
}

impl SpatialConfig {
    pub fn chunk_size(&self) -> SpatialResult<ChunkSize> {
        ChunkSize::new(self.chunk_size)
    }
}
