//! Radius and nearest-neighbour queries.
//!
//! Candidate chunks are the square window `[c-span, c+span]²` with
//! `span = ceil(radius / chunk_size)`. Every candidate then goes through the
//! exact, inclusive [`Position::within`] test, so bucketing only prunes and
//! never changes the result.

use hashbrown::HashSet;
use loam_entity::{Entity, Position, Tags};

use crate::{ChunkBucket, SpatialError, SpatialIndex, SpatialResult};

/// Read-only proximity queries.
///
/// Implemented by the index, by its shared handle, and by the linear
/// fallback scan; all implementations return the same results for the same
/// world state.
pub trait SpatialQuery {
    /// Calls `visit` with every entity carrying all of `required` whose
    /// distance to `center` is `<= radius`. Visit order is unspecified.
    fn for_each_within(
        &self,
        center: Position,
        radius: f64,
        required: Tags,
        visit: &mut dyn FnMut(Entity, Position),
    ) -> SpatialResult<()>;

    /// Nearest entity carrying all of `tag` within `search_radius`.
    ///
    /// Equal distances resolve to the smallest [`Entity`].
    fn query_nearest_of_tag(
        &self,
        center: Position,
        tag: Tags,
        search_radius: f64,
    ) -> SpatialResult<Option<Entity>>;

    fn query_radius(
        &self,
        center: Position,
        radius: f64,
        required: Tags,
    ) -> SpatialResult<HashSet<Entity>> {
        let mut found = HashSet::new();
        self.for_each_within(center, radius, required, &mut |entity, _| {
            found.insert(entity);
        })?;
        Ok(found)
    }

    fn count_within(&self, center: Position, radius: f64, required: Tags) -> SpatialResult<usize> {
        let mut count = 0;
        self.for_each_within(center, radius, required, &mut |_, _| count += 1)?;
        Ok(count)
    }
}

/// Validates query inputs and returns the squared radius.
///
/// Shared by every [`SpatialQuery`] implementation so they reject exactly the
/// same inputs.
pub fn radius_squared(center: Position, radius: f64) -> SpatialResult<f64> {
    if !radius.is_finite() {
        return Err(SpatialError::NonFiniteRadius(radius));
    }
    if radius < 0.0 {
        return Err(SpatialError::NegativeRadius(radius));
    }
    if !center.is_finite() {
        return Err(SpatialError::InvalidCenter {
            x: center.x,
            y: center.y,
        });
    }
    Ok(radius * radius)
}

/// Running minimum for nearest queries with the `(distance², entity)` order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nearest {
    best: Option<(f64, Entity)>,
}

impl Nearest {
    #[must_use]
    pub const fn new() -> Self {
        Self { best: None }
    }

    pub fn offer(&mut self, entity: Entity, distance_squared: f64) {
        let better = match self.best {
            None => true,
            Some((best_sq, best)) => {
                distance_squared < best_sq || (distance_squared == best_sq && entity < best)
            }
        };
        if better {
            self.best = Some((distance_squared, entity));
        }
    }

    #[must_use]
    pub fn distance_squared(&self) -> Option<f64> {
        self.best.map(|(d, _)| d)
    }

    #[must_use]
    pub fn entity(&self) -> Option<Entity> {
        self.best.map(|(_, e)| e)
    }
}

impl SpatialIndex {
    /// Calls `f` with every bucket a query of `radius` around `center` must
    /// inspect.
    ///
    /// When the window holds more keys than there are occupied buckets, the
    /// occupied buckets are walked and filtered by window instead, which
    /// keeps very large radii from enumerating empty chunks.
    fn for_each_candidate(&self, center: Position, radius: f64, mut f: impl FnMut(&ChunkBucket)) {
        let Some(center_key) = self.chunk_size.key_of(center) else {
            self.buckets.values().for_each(f);
            return;
        };

        let window = self.chunk_size.window(center_key, radius);
        if window.area() > self.buckets.len() as u128 {
            for (key, bucket) in &self.buckets {
                if window.contains(*key) {
                    f(bucket);
                }
            }
        } else {
            for key in window.keys() {
                if let Some(bucket) = self.buckets.get(&key) {
                    f(bucket);
                }
            }
        }
    }

    fn offer_bucket(bucket: &ChunkBucket, center: Position, radius_sq: f64, tag: Tags, nearest: &mut Nearest) {
        bucket.for_each_matching(tag, |entity, resident| {
            if resident.position.within(center, radius_sq) {
                nearest.offer(entity, resident.position.distance_squared(center));
            }
        });
    }
}

impl SpatialQuery for SpatialIndex {
    fn for_each_within(
        &self,
        center: Position,
        radius: f64,
        required: Tags,
        visit: &mut dyn FnMut(Entity, Position),
    ) -> SpatialResult<()> {
        let radius_sq = radius_squared(center, radius)?;

        self.for_each_candidate(center, radius, |bucket| {
            bucket.for_each_matching(required, |entity, resident| {
                if resident.position.within(center, radius_sq) {
                    visit(entity, resident.position);
                }
            });
        });
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

        let Some(center_key) = self.chunk_size.key_of(center) else {
            for bucket in self.buckets.values() {
                Self::offer_bucket(bucket, center, radius_sq, tag, &mut nearest);
            }
            return Ok(nearest.entity());
        };

        let span = self.chunk_size.span(search_radius);
        let window = self.chunk_size.window(center_key, search_radius);
        if window.area() > self.buckets.len() as u128 {
            self.for_each_candidate(center, search_radius, |bucket| {
                Self::offer_bucket(bucket, center, radius_sq, tag, &mut nearest);
            });
            return Ok(nearest.entity());
        }

        // Everything outside rings 0..=d is farther than d chunk widths.
        let size = self.chunk_size.world_units();
        let max_ring = u32::try_from(span).unwrap_or(u32::MAX);
        for d in 0..=max_ring {
            for key in center_key.ring(d) {
                if let Some(bucket) = self.buckets.get(&key) {
                    Self::offer_bucket(bucket, center, radius_sq, tag, &mut nearest);
                }
            }
            let reach = f64::from(d) * size;
            if nearest.distance_squared().is_some_and(|best| best < reach * reach) {
                break;
            }
        }
        Ok(nearest.entity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkSize;
    use loam_entity::Generation;

    fn entity(id: u32) -> Entity {
        Entity::new(id, Generation::first())
    }

    fn index() -> SpatialIndex {
        SpatialIndex::new(ChunkSize::new(32).unwrap())
    }

    fn sorted(set: HashSet<Entity>) -> Vec<Entity> {
        let mut v: Vec<_> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn radius_excludes_far_chunk() {
        let mut index = index();
        index.insert(entity(1), Position::new(0.0, 0.0), Tags::AGENT);
        index.insert(entity(2), Position::new(5.0, 5.0), Tags::AGENT);
        index.insert(entity(3), Position::new(40.0, 40.0), Tags::AGENT);

        let found = index
            .query_radius(Position::new(0.0, 0.0), 10.0, Tags::empty())
            .unwrap();
        assert_eq!(sorted(found), vec![entity(1), entity(2)]);
    }

    #[test]
    fn tag_filter_selects_resource() {
        let mut index = index();
        let pos = Position::new(12.0, -7.0);
        index.insert(entity(1), pos, Tags::AGENT);
        index.insert(entity(2), pos, Tags::RESOURCE);

        let found = index.query_radius(pos, 1.0, Tags::RESOURCE).unwrap();
        assert_eq!(sorted(found), vec![entity(2)]);
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut index = index();
        index.insert(entity(1), Position::new(32.0, 0.0), Tags::AGENT);
        index.insert(entity(2), Position::new(0.0, -10.0), Tags::AGENT);

        let found = index
            .query_radius(Position::new(22.0, 0.0), 10.0, Tags::empty())
            .unwrap();
        assert_eq!(sorted(found), vec![entity(1)]);

        let found = index
            .query_radius(Position::new(0.0, 0.0), 10.0, Tags::empty())
            .unwrap();
        assert!(found.contains(&entity(2)));
    }

    #[test]
    fn zero_radius_hits_exact_position() {
        let mut index = index();
        index.insert(entity(1), Position::new(3.0, 3.0), Tags::PLANT);

        assert_eq!(
            index.count_within(Position::new(3.0, 3.0), 0.0, Tags::empty()),
            Ok(1)
        );
        assert_eq!(
            index.count_within(Position::new(3.0, 3.1), 0.0, Tags::empty()),
            Ok(0)
        );
    }

    #[test]
    fn invalid_inputs_are_errors() {
        let index = index();
        let origin = Position::default();

        assert_eq!(
            index.query_radius(origin, -1.0, Tags::empty()),
            Err(SpatialError::NegativeRadius(-1.0))
        );
        assert!(matches!(
            index.query_radius(origin, f64::NAN, Tags::empty()),
            Err(SpatialError::NonFiniteRadius(_))
        ));
        assert!(matches!(
            index.query_nearest_of_tag(Position::new(f64::NAN, 0.0), Tags::AGENT, 5.0),
            Err(SpatialError::InvalidCenter { .. })
        ));
    }

    #[test]
    fn empty_index_has_no_matches() {
        let index = index();

        assert!(index.query_radius(Position::default(), 100.0, Tags::empty()).unwrap().is_empty());
        assert_eq!(
            index.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 100.0),
            Ok(None)
        );
    }

    #[test]
    fn huge_radius_takes_occupied_path() {
        let mut index = index();
        index.insert(entity(1), Position::new(-5000.0, 10.0), Tags::AGENT);
        index.insert(entity(2), Position::new(7000.0, -3000.0), Tags::AGENT);
        index.insert(entity(3), Position::new(1.0, 1.0), Tags::RESOURCE);

        let found = index
            .query_radius(Position::default(), 1.0e6, Tags::AGENT)
            .unwrap();
        assert_eq!(sorted(found), vec![entity(1), entity(2)]);
    }

    #[test]
    fn nearest_prefers_closer_outer_ring() {
        let mut index = index();
        index.insert(entity(1), Position::new(33.0, 1.0), Tags::RESOURCE);
        index.insert(entity(2), Position::new(2.0, 31.9), Tags::RESOURCE);
        index.insert(entity(3), Position::new(1.0, 1.0), Tags::AGENT);

        let nearest = index
            .query_nearest_of_tag(Position::new(31.0, 1.0), Tags::RESOURCE, 100.0)
            .unwrap();
        assert_eq!(nearest, Some(entity(1)));
    }

    #[test]
    fn nearest_respects_search_radius() {
        let mut index = index();
        index.insert(entity(1), Position::new(50.0, 0.0), Tags::RESOURCE);

        assert_eq!(
            index.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 49.9),
            Ok(None)
        );
        assert_eq!(
            index.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 50.0),
            Ok(Some(entity(1)))
        );
    }

    #[test]
    fn nearest_ties_pick_smallest_entity() {
        let mut index = index();
        index.insert(entity(9), Position::new(-4.0, 0.0), Tags::RESOURCE);
        index.insert(entity(4), Position::new(4.0, 0.0), Tags::RESOURCE);
        index.insert(entity(6), Position::new(0.0, 4.0), Tags::RESOURCE);

        assert_eq!(
            index.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 10.0),
            Ok(Some(entity(4)))
        );
    }

    #[test]
    fn nearest_tracker_order() {
        let mut nearest = Nearest::new();
        nearest.offer(entity(5), 4.0);
        nearest.offer(entity(2), 9.0);
        nearest.offer(entity(3), 4.0);

        assert_eq!(nearest.entity(), Some(entity(3)));
        assert_eq!(nearest.distance_squared(), Some(4.0));
    }
}
