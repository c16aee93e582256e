//! Terrain configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u64,
    /// Noise height below which tiles are water, in `[-1, 1]`.
    pub sea_level: f64,
    /// Chunks around each agent the streaming system keeps generated.
    pub stream_radius_chunks: u32,
    /// Upper bound on chunks generated per tick.
    pub generation_budget: usize,
    /// Radius in chunks around the origin generated before the first tick.
    pub pregenerate_radius: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            sea_level: -0.15,
            stream_radius_chunks: 2,
            generation_budget: 4,
            pregenerate_radius: 2,
        }
    }
}
