//! Budgeted terrain generation around agents.

use hashbrown::HashMap;
use loam_entity::Tags;
use loam_spatial::ChunkKey;
use tracing::debug;

use crate::{Phase, System, World};

/// Generates missing chunks near agents, nearest first, at most `budget`
/// per tick.
///
/// This is the only place outside setup where terrain is generated, so the
/// worst-case generation cost of any tick is bounded by the budget no matter
/// how consumers throttle their reads.
#[derive(Debug)]
pub struct TerrainStreamingSystem {
    radius: u32,
    budget: usize,
    /// Ungenerated chunks still wanted after the last run.
    backlog: usize,
    generated_total: u64,
}

impl TerrainStreamingSystem {
    #[must_use]
    pub const fn new(radius_chunks: u32, budget: usize) -> Self {
        Self {
            radius: radius_chunks,
            budget,
            backlog: 0,
            generated_total: 0,
        }
    }

    #[must_use]
    pub const fn backlog(&self) -> usize {
        self.backlog
    }

    #[must_use]
    pub const fn generated_total(&self) -> u64 {
        self.generated_total
    }

    /// Missing chunks within `radius` of any agent, nearest first.
    fn wanted(&self, world: &World) -> Vec<ChunkKey> {
        let size = world.chunk_size();
        let terrain = world.terrain();
        let mut distance: HashMap<ChunkKey, u32> = HashMap::new();

        for (_, record) in world.entities().with_tags(Tags::AGENT) {
            let Some(center) = size.key_of(record.position) else {
                continue;
            };
            for d in 0..=self.radius {
                for key in center.ring(d) {
                    if terrain.is_generated(key) {
                        continue;
                    }
                    distance
                        .entry(key)
                        .and_modify(|best| *best = (*best).min(d))
                        .or_insert(d);
                }
            }
        }

        let mut wanted: Vec<(u32, ChunkKey)> = distance.into_iter().map(|(k, d)| (d, k)).collect();
        wanted.sort_unstable();
        wanted.into_iter().map(|(_, key)| key).collect()
    }
}

impl System for TerrainStreamingSystem {
    fn name(&self) -> &'static str {
        "terrain_streaming"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn priority(&self) -> i32 {
        10
    }

    fn run(&mut self, world: &mut World) {
        let wanted = self.wanted(world);
        let take = wanted.len().min(self.budget);

        let terrain = world.terrain_mut();
        let mut generated = 0u64;
        for &key in &wanted[..take] {
            if terrain.generate(key) {
                generated += 1;
            }
        }

        self.backlog = wanted.len() - take;
        self.generated_total += generated;
        if generated > 0 {
            debug!(generated, backlog = self.backlog, "streamed terrain");
        }
    }
}
