//! Index injection with linear fallback.
//!
//! A consumer holds a [`Proximity`]. Wired, it asks the shared index;
//! unwired, it scans the entity table. Both paths use the same exactness
//! predicate, tag semantics, input validation and nearest tie-break, so a
//! consumer behaves identically either way and only its cost changes.

use hashbrown::HashSet;
use loam_entity::{Entity, EntityStore, Position, Tags};
use loam_spatial::{
    ChunkSize, Nearest, SharedIndex, SpatialQuery, SpatialResult, radius_squared,
};
use loam_tick::World;

/// Brute-force [`SpatialQuery`] over the entity table.
///
/// Entities the index would refuse (non-finite or out-of-range positions)
/// are skipped here too.
#[derive(Debug, Clone, Copy)]
pub struct LinearScan<'a> {
    entities: &'a EntityStore,
    chunk_size: ChunkSize,
}

impl<'a> LinearScan<'a> {
    #[must_use]
    pub const fn new(entities: &'a EntityStore, chunk_size: ChunkSize) -> Self {
        Self {
            entities,
            chunk_size,
        }
    }

    #[must_use]
    pub fn over(world: &'a World) -> Self {
        Self::new(world.entities(), world.chunk_size())
    }

    fn indexable(&self, position: Position) -> bool {
        self.chunk_size.key_of(position).is_some()
    }
}

impl SpatialQuery for LinearScan<'_> {
    fn for_each_within(
        &self,
        center: Position,
        radius: f64,
        required: Tags,
        visit: &mut dyn FnMut(Entity, Position),
    ) -> SpatialResult<()> {
        let radius_sq = radius_squared(center, radius)?;

        for (entity, record) in self.entities.with_tags(required) {
            if record.position.within(center, radius_sq) && self.indexable(record.position) {
                visit(entity, record.position);
            }
        }
        Ok(())
    }

    fn query_nearest_of_tag(
        &self,
        center: Position,
        tag: Tags,
        search_radius: f64,
    ) -> SpatialResult<Option<Entity>> {
        let radius_sq = radius_squared(center, search_radius)?;
        let mut nearest = Nearest::new();

        for (entity, record) in self.entities.with_tags(tag) {
            if record.position.within(center, radius_sq) && self.indexable(record.position) {
                nearest.offer(entity, record.position.distance_squared(center));
            }
        }
        Ok(nearest.entity())
    }
}

/// A consumer's optional binding to the spatial index.
#[derive(Debug, Clone, Default)]
pub struct Proximity {
    index: Option<SharedIndex>,
}

impl Proximity {
    /// Unwired; every query takes the linear path.
    #[must_use]
    pub const fn unwired() -> Self {
        Self { index: None }
    }

    #[must_use]
    pub const fn wired(index: SharedIndex) -> Self {
        Self { index: Some(index) }
    }

    pub fn wire(&mut self, index: SharedIndex) {
        self.index = Some(index);
    }

    /// Drops the binding, e.g. to roll a consumer back to the linear path.
    pub fn unwire(&mut self) -> Option<SharedIndex> {
        self.index.take()
    }

    #[must_use]
    pub const fn is_wired(&self) -> bool {
        self.index.is_some()
    }

    /// Runs `f` against whichever query engine this binding selects.
    pub fn with_engine<R>(&self, world: &World, f: impl FnOnce(&dyn SpatialQuery) -> R) -> R {
        match &self.index {
            Some(index) => f(index),
            None => f(&LinearScan::over(world)),
        }
    }

    pub fn query_radius(
        &self,
        world: &World,
        center: Position,
        radius: f64,
        required: Tags,
    ) -> SpatialResult<HashSet<Entity>> {
        self.with_engine(world, |q| q.query_radius(center, radius, required))
    }

    pub fn query_nearest_of_tag(
        &self,
        world: &World,
        center: Position,
        tag: Tags,
        search_radius: f64,
    ) -> SpatialResult<Option<Entity>> {
        self.with_engine(world, |q| q.query_nearest_of_tag(center, tag, search_radius))
    }

    pub fn for_each_within(
        &self,
        world: &World,
        center: Position,
        radius: f64,
        required: Tags,
        visit: &mut dyn FnMut(Entity, Position),
    ) -> SpatialResult<()> {
        self.with_engine(world, |q| q.for_each_within(center, radius, required, visit))
    }

    pub fn count_within(
        &self,
        world: &World,
        center: Position,
        radius: f64,
        required: Tags,
    ) -> SpatialResult<usize> {
        self.with_engine(world, |q| q.count_within(center, radius, required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_spatial::{SpatialError, SpatialIndex};
    use loam_terrain::{FlatTerrain, MemoryChunkStore, TileKind};

    fn world() -> World {
        let size = ChunkSize::new(32).unwrap();
        World::new(
            SpatialIndex::new(size),
            MemoryChunkStore::new(size, FlatTerrain(TileKind::Grass)),
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn wire_and_unwire() {
        let world = world();
        let mut proximity = Proximity::unwired();
        assert!(!proximity.is_wired());

        proximity.wire(world.spatial_handle());
        assert!(proximity.is_wired());
        assert!(proximity.unwire().is_some());
        assert!(!proximity.is_wired());
    }

    #[test]
    fn both_paths_answer_spec_scenario() {
        let mut world = world();
        let a = world.spawn(Position::new(0.0, 0.0), Tags::AGENT);
        let b = world.spawn(Position::new(5.0, 5.0), Tags::AGENT);
        world.spawn(Position::new(40.0, 40.0), Tags::AGENT);

        let expected: HashSet<Entity> = [a, b].into_iter().collect();
        for proximity in [Proximity::unwired(), Proximity::wired(world.spatial_handle())] {
            assert_eq!(
                proximity
                    .query_radius(&world, Position::default(), 10.0, Tags::empty())
                    .unwrap(),
                expected
            );
        }
    }

    #[test]
    fn fallback_skips_unindexable_positions() {
        let mut world = world();
        world.spawn(Position::new(f64::NAN, 0.0), Tags::RESOURCE);
        world.spawn(Position::new(1.0e300, 0.0), Tags::RESOURCE);
        let ok = world.spawn(Position::new(2.0, 0.0), Tags::RESOURCE);

        let linear = LinearScan::over(&world);
        let center = Position::new(1.0e300, 0.0);
        assert_eq!(linear.count_within(center, 1.0, Tags::empty()), Ok(0));
        assert_eq!(
            linear.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 1.0e301),
            Ok(Some(ok))
        );
    }

    #[test]
    fn fallback_rejects_same_inputs() {
        let world = world();
        let linear = LinearScan::over(&world);

        assert_eq!(
            linear.query_radius(Position::default(), -2.0, Tags::empty()),
            Err(SpatialError::NegativeRadius(-2.0))
        );
    }
}
