//! Shared handle to the index.

use std::sync::Arc;

use loam_entity::{Entity, Position, Tags};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{SpatialIndex, SpatialQuery, SpatialResult};

/// Cloneable handle wired into consuming systems.
///
/// Every mutation holds the write lock for its whole duration, so a reader
/// never observes a half-applied move. Within a tick the scheduler already
/// serialises writers and readers; the lock is uncontended in practice.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<SpatialIndex>>,
}

impl SharedIndex {
    #[must_use]
    pub fn new(index: SpatialIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SpatialIndex> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SpatialIndex> {
        self.inner.write()
    }

    /// Whether two handles refer to the same index.
    #[must_use]
    pub fn same_index(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl SpatialQuery for SharedIndex {
    fn for_each_within(
        &self,
        center: Position,
        radius: f64,
        required: Tags,
        visit: &mut dyn FnMut(Entity, Position),
    ) -> SpatialResult<()> {
        self.read().for_each_within(center, radius, required, visit)
    }

    fn query_nearest_of_tag(
        &self,
        center: Position,
        tag: Tags,
        search_radius: f64,
    ) -> SpatialResult<Option<Entity>> {
        self.read().query_nearest_of_tag(center, tag, search_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_entity::Generation;

    #[test]
    fn clones_share_state() {
        let shared = SharedIndex::default();
        let reader = shared.clone();
        let e = Entity::new(1, Generation::first());

        shared.write().insert(e, Position::new(3.0, 4.0), Tags::RESOURCE);

        assert!(reader.same_index(&shared));
        assert_eq!(
            reader.query_nearest_of_tag(Position::default(), Tags::RESOURCE, 5.0),
            Ok(Some(e))
        );
        assert_eq!(reader.count_within(Position::default(), 4.9, Tags::empty()), Ok(0));
    }
}
