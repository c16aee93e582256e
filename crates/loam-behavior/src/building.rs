//! Construction placement checks.

use std::collections::VecDeque;

use loam_entity::{Entity, Position, Tags};
use loam_terrain::tile_coords;
use loam_tick::{Phase, System, Throttle, World};
use tracing::{debug, info};

use crate::{Proximity, SpatialConsumer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildRequest {
    pub position: Position,
    /// Agent asking for the building, if any. A request outlives its
    /// requester only as a rejection.
    pub requester: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another building stands within the clearance radius.
    Crowded(Entity),
    Water,
    /// Surface that does not take foundations (rock, void).
    Unbuildable,
    /// Non-finite position, or one whose tile is outside the tile range.
    InvalidPosition,
    /// The requesting agent despawned while the request waited.
    RequesterGone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuildOutcome {
    Approved { request: BuildRequest, building: Entity },
    Rejected { request: BuildRequest, reason: RejectReason },
    /// Terrain under the site is not generated yet; retried next run.
    Deferred { request: BuildRequest },
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    request: BuildRequest,
    /// Already recorded as deferred.
    deferred: bool,
}

/// Validates queued construction requests and spawns approved buildings.
#[derive(Debug)]
pub struct BuildingSystem {
    proximity: Proximity,
    throttle: Throttle,
    clearance: f64,
    queue: VecDeque<Pending>,
    outcomes: Vec<BuildOutcome>,
}

impl BuildingSystem {
    #[must_use]
    pub fn new(clearance: f64, throttle: Throttle) -> Self {
        Self {
            proximity: Proximity::unwired(),
            throttle,
            clearance,
            queue: VecDeque::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn request(&mut self, request: BuildRequest) {
        self.queue.push_back(Pending {
            request,
            deferred: false,
        });
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Every outcome so far, in decision order. A request that stays
    /// deferred over several runs is recorded once, when first deferred.
    #[must_use]
    pub fn outcomes(&self) -> &[BuildOutcome] {
        &self.outcomes
    }

    /// Hands over the outcomes recorded since the last call.
    pub fn take_outcomes(&mut self) -> Vec<BuildOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    fn decide(&self, world: &mut World, request: BuildRequest) -> BuildOutcome {
        let reject = |reason| BuildOutcome::Rejected { request, reason };

        if request.requester.is_some_and(|agent| world.get(agent).is_none()) {
            return reject(RejectReason::RequesterGone);
        }
        let Some((x, y)) = tile_coords(request.position) else {
            return reject(RejectReason::InvalidPosition);
        };
        let Some(tile) = world.terrain_guard().tile_if_generated(x, y) else {
            return BuildOutcome::Deferred { request };
        };
        if tile.is_water() {
            return reject(RejectReason::Water);
        }
        if !tile.kind.is_buildable() {
            return reject(RejectReason::Unbuildable);
        }

        let neighbor = match self.proximity.query_nearest_of_tag(
            world,
            request.position,
            Tags::BUILDING,
            self.clearance,
        ) {
            Ok(neighbor) => neighbor,
            Err(err) => {
                debug!(%err, "building request rejected");
                return reject(RejectReason::InvalidPosition);
            }
        };
        if let Some(other) = neighbor {
            return reject(RejectReason::Crowded(other));
        }

        let building = world.spawn(request.position, Tags::BUILDING);
        BuildOutcome::Approved { request, building }
    }
}

impl SpatialConsumer for BuildingSystem {
    fn proximity(&self) -> &Proximity {
        &self.proximity
    }

    fn proximity_mut(&mut self) -> &mut Proximity {
        &mut self.proximity
    }
}

impl System for BuildingSystem {
    fn name(&self) -> &'static str {
        "building"
    }

    fn phase(&self) -> Phase {
        Phase::Decision
    }

    fn priority(&self) -> i32 {
        30
    }

    fn run(&mut self, world: &mut World) {
        if !self.throttle.ready(world.tick()) || self.queue.is_empty() {
            return;
        }

        let mut waiting = VecDeque::new();
        while let Some(pending) = self.queue.pop_front() {
            let outcome = self.decide(world, pending.request);
            match outcome {
                BuildOutcome::Deferred { request } => {
                    if !pending.deferred {
                        self.outcomes.push(outcome);
                    }
                    waiting.push_back(Pending {
                        request,
                        deferred: true,
                    });
                    continue;
                }
                BuildOutcome::Approved { request, building } => {
                    info!(
                        %building,
                        requester = ?request.requester,
                        x = request.position.x,
                        y = request.position.y,
                        "building placed"
                    );
                }
                BuildOutcome::Rejected { .. } => {}
            }
            self.outcomes.push(outcome);
        }
        self.queue = waiting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_spatial::{ChunkKey, ChunkSize, SpatialIndex};
    use loam_terrain::{Chunk, FlatTerrain, MemoryChunkStore, Tile, TileKind};

    fn world() -> World {
        let size = ChunkSize::new(16).unwrap();
        let mut world = World::new(
            SpatialIndex::new(size),
            MemoryChunkStore::new(size, FlatTerrain(TileKind::Grass)),
            1.0,
        )
        .unwrap();
        world.terrain_mut().generate(ChunkKey::new(0, 0));
        world
    }

    fn at(x: f64, y: f64) -> BuildRequest {
        BuildRequest {
            position: Position::new(x, y),
            requester: None,
        }
    }

    #[test]
    fn approves_then_rejects_crowded_site() {
        let mut world = world();
        let mut building = BuildingSystem::new(5.0, Throttle::every_tick());
        building.wire(world.spatial_handle());

        building.request(at(4.0, 4.0));
        building.request(at(6.0, 4.0));
        building.request(at(12.0, 4.0));
        building.run(&mut world);

        let outcomes = building.outcomes();
        let BuildOutcome::Approved { building: first, .. } = outcomes[0] else {
            panic!("expected approval, got {:?}", outcomes[0]);
        };
        assert_eq!(
            outcomes[1],
            BuildOutcome::Rejected {
                request: at(6.0, 4.0),
                reason: RejectReason::Crowded(first)
            }
        );
        assert!(matches!(outcomes[2], BuildOutcome::Approved { .. }));
        assert_eq!(world.entities().ids_with_tags(Tags::BUILDING).len(), 2);
    }

    #[test]
    fn defers_on_ungenerated_terrain_without_generating() {
        let mut world = world();
        let mut building = BuildingSystem::new(5.0, Throttle::every_tick());

        building.request(at(40.0, 40.0));
        building.run(&mut world);

        assert_eq!(building.pending(), 1);
        assert!(matches!(building.outcomes()[0], BuildOutcome::Deferred { .. }));
        assert_eq!(world.terrain().generation_runs(), 1);

        world.terrain_mut().generate(ChunkKey::new(2, 2));
        building.run(&mut world);
        assert_eq!(building.pending(), 0);
        assert!(matches!(building.outcomes()[1], BuildOutcome::Approved { .. }));
    }

    #[test]
    fn rejects_water_and_invalid_sites() {
        let mut world = world();
        let size = world.chunk_size();
        world
            .terrain_mut()
            .insert_chunk(ChunkKey::new(1, 0), Chunk::filled(size, Tile::new(TileKind::Water, 0)));

        let mut building = BuildingSystem::new(5.0, Throttle::every_tick());
        building.request(at(20.0, 2.0));
        building.request(at(f64::NAN, 2.0));
        building.run(&mut world);

        assert_eq!(
            building.outcomes()[0],
            BuildOutcome::Rejected {
                request: at(20.0, 2.0),
                reason: RejectReason::Water
            }
        );
        assert!(matches!(
            building.outcomes()[1],
            BuildOutcome::Rejected {
                reason: RejectReason::InvalidPosition,
                ..
            }
        ));
        assert_eq!(building.pending(), 0);
    }

    #[test]
    fn out_of_range_sites_rejected_not_deferred() {
        let mut world = world();
        let mut building = BuildingSystem::new(5.0, Throttle::every_tick());
        building.request(at(1.0e12, 0.0));
        building.request(at(3.0e9, 0.0));

        for _ in 0..50 {
            building.run(&mut world);
        }

        assert_eq!(building.pending(), 0);
        assert_eq!(building.outcomes().len(), 2);
        assert!(building.outcomes().iter().all(|outcome| matches!(
            outcome,
            BuildOutcome::Rejected {
                reason: RejectReason::InvalidPosition,
                ..
            }
        )));
    }

    #[test]
    fn repeated_deferral_recorded_once() {
        let mut world = world();
        let mut building = BuildingSystem::new(5.0, Throttle::every_tick());
        building.request(at(40.0, 40.0));

        for _ in 0..100 {
            building.run(&mut world);
        }
        assert_eq!(building.pending(), 1);
        assert_eq!(building.outcomes().len(), 1);

        world.terrain_mut().generate(ChunkKey::new(2, 2));
        building.run(&mut world);
        building.run(&mut world);

        assert_eq!(building.pending(), 0);
        assert_eq!(building.outcomes().len(), 2);
        assert!(matches!(building.outcomes()[1], BuildOutcome::Approved { .. }));
    }

    #[test]
    fn despawned_requester_rejected() {
        let mut world = world();
        let gone = world.spawn(Position::new(1.0, 1.0), Tags::AGENT);
        let alive = world.spawn(Position::new(2.0, 2.0), Tags::AGENT);
        world.despawn(gone);

        let mut building = BuildingSystem::new(2.0, Throttle::every_tick());
        building.request(BuildRequest {
            position: Position::new(4.0, 4.0),
            requester: Some(gone),
        });
        building.request(BuildRequest {
            position: Position::new(12.0, 12.0),
            requester: Some(alive),
        });
        building.run(&mut world);

        assert!(matches!(
            building.outcomes()[0],
            BuildOutcome::Rejected {
                reason: RejectReason::RequesterGone,
                ..
            }
        ));
        let BuildOutcome::Approved { request, .. } = building.outcomes()[1] else {
            panic!("expected approval, got {:?}", building.outcomes()[1]);
        };
        assert_eq!(request.requester, Some(alive));
    }
}
