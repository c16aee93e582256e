//! Water checks under each agent.

use hashbrown::HashMap;
use loam_entity::{Entity, Tags};
use loam_tick::{Phase, System, Throttle, World};

/// Tracks which agents stand on water.
///
/// Reads tiles only through the generation guard. An agent over an
/// ungenerated chunk keeps its previous state for this tick.
#[derive(Debug)]
pub struct SwimmingSystem {
    throttle: Throttle,
    swimming: HashMap<Entity, bool>,
    skipped: u64,
}

impl SwimmingSystem {
    #[must_use]
    pub fn new(throttle: Throttle) -> Self {
        Self {
            throttle,
            swimming: HashMap::new(),
            skipped: 0,
        }
    }

    /// `None` until the agent's tile has been read at least once.
    #[must_use]
    pub fn is_swimming(&self, agent: Entity) -> Option<bool> {
        self.swimming.get(&agent).copied()
    }

    #[must_use]
    pub fn swimmer_count(&self) -> usize {
        self.swimming.values().filter(|&&s| s).count()
    }

    /// Agent checks skipped for lack of generated terrain.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl System for SwimmingSystem {
    fn name(&self) -> &'static str {
        "swimming"
    }

    fn phase(&self) -> Phase {
        Phase::Decision
    }

    fn priority(&self) -> i32 {
        10
    }

    fn run(&mut self, world: &mut World) {
        if !self.throttle.ready(world.tick()) {
            return;
        }

        self.swimming.retain(|agent, _| world.get(*agent).is_some());
        let guard = world.terrain_guard();
        for (agent, record) in world.entities().with_tags(Tags::AGENT) {
            match guard.tile_at_position(record.position) {
                Some(tile) => {
                    self.swimming.insert(agent, tile.is_water());
                }
                None => self.skipped += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_entity::Position;
    use loam_spatial::{ChunkKey, ChunkSize, SpatialIndex};
    use loam_terrain::{FlatTerrain, MemoryChunkStore, TileKind};

    #[test]
    fn ungenerated_tiles_are_skipped_not_generated() {
        let size = ChunkSize::new(16).unwrap();
        let mut world = World::new(
            SpatialIndex::new(size),
            MemoryChunkStore::new(size, FlatTerrain(TileKind::Water)),
            1.0,
        )
        .unwrap();
        world.terrain_mut().generate(ChunkKey::new(0, 0));

        let wet = world.spawn(Position::new(3.0, 3.0), Tags::AGENT);
        let far = world.spawn(Position::new(100.0, 3.0), Tags::AGENT);

        let mut swimming = SwimmingSystem::new(Throttle::every_tick());
        swimming.run(&mut world);

        assert_eq!(swimming.is_swimming(wet), Some(true));
        assert_eq!(swimming.is_swimming(far), None);
        assert_eq!(swimming.skipped(), 1);
        assert_eq!(world.terrain().generation_runs(), 1);
    }
}
