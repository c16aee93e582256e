//! The simulation world.

use loam_entity::{Entity, EntityRecord, EntityStore, Position, Tags, Velocity};
use loam_spatial::{ChunkSize, EntityLifecycle, SharedIndex, SpatialIndex};
use loam_terrain::{ChunkStore, GenerationGuard, MemoryChunkStore};
use tracing::debug;

use crate::{TickError, TickResult};

/// Entity table, spatial index and terrain for one simulation.
///
/// Every mutation of a position, a tag set, or the entity population goes
/// through this type, which forwards it to the index before returning. The
/// index therefore never lags the table at a query.
#[derive(Debug)]
pub struct World {
    entities: EntityStore,
    index: SharedIndex,
    terrain: MemoryChunkStore,
    tick: u64,
    dt: f64,
}

impl World {
    pub fn new(index: SpatialIndex, terrain: MemoryChunkStore, dt: f64) -> TickResult<Self> {
        let (index_size, terrain_size) = (index.chunk_size(), terrain.chunk_size());
        if index_size != terrain_size {
            return Err(TickError::ChunkSizeMismatch {
                index: index_size.tiles(),
                terrain: terrain_size.tiles(),
            });
        }

        Ok(Self {
            entities: EntityStore::new(),
            index: SharedIndex::new(index),
            terrain,
            tick: 0,
            dt,
        })
    }

    // ==================== Lifecycle ====================

    pub fn spawn(&mut self, position: Position, tags: Tags) -> Entity {
        self.spawn_record(EntityRecord::new(position, tags))
    }

    pub fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        let entity = self.entities.spawn(record);
        self.index
            .write()
            .on_entity_created(entity, record.position, record.tags);
        entity
    }

    pub fn despawn(&mut self, entity: Entity) -> Option<EntityRecord> {
        let record = self.entities.despawn(entity)?;
        self.index.write().on_entity_destroyed(entity);
        debug!(%entity, "despawned");
        Some(record)
    }

    /// Moves an entity, keeping the index in step.
    pub fn set_position(&mut self, entity: Entity, position: Position) -> bool {
        let Some(record) = self.entities.get_mut(entity) else {
            return false;
        };
        let old = record.position;
        record.position = position;
        self.index.write().on_entity_moved(entity, old, position);
        true
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Velocity) -> bool {
        match self.entities.get_mut(entity) {
            Some(record) => {
                record.velocity = velocity;
                true
            }
            None => false,
        }
    }

    pub fn set_tags(&mut self, entity: Entity, tags: Tags) -> bool {
        let Some(record) = self.entities.get_mut(entity) else {
            return false;
        };
        record.tags = tags;
        self.index.write().set_tags(entity, tags);
        true
    }

    // ==================== Access ====================

    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        self.entities.get(entity)
    }

    /// Handle for wiring consumers to the index.
    #[must_use]
    pub fn spatial_handle(&self) -> SharedIndex {
        self.index.clone()
    }

    #[must_use]
    pub const fn terrain(&self) -> &MemoryChunkStore {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut MemoryChunkStore {
        &mut self.terrain
    }

    /// Non-generating tile access for hot loops.
    #[must_use]
    pub const fn terrain_guard(&self) -> GenerationGuard<'_, MemoryChunkStore> {
        GenerationGuard::new(&self.terrain)
    }

    #[must_use]
    pub fn chunk_size(&self) -> ChunkSize {
        self.terrain.chunk_size()
    }

    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Moves to the next tick. The scheduler calls this after the last
    /// system; manual drivers call it themselves.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    // ==================== Verification ====================

    /// Checks the index against the entity table.
    ///
    /// Every entity with a valid position must be indexed at exactly that
    /// position, entities with invalid positions must be absent, and the
    /// index must be internally coherent.
    pub fn verify_index(&self) -> TickResult<()> {
        let index = self.index.read();
        index.verify_coherence()?;

        let mut indexed = 0usize;
        for (entity, record) in self.entities.iter() {
            let stored = index.position_of(entity);
            let valid = index.chunk_size().key_of(record.position).is_some();
            let agrees = if valid {
                stored == Some(record.position)
            } else {
                stored.is_none()
            };
            if !agrees {
                return Err(TickError::OutOfSync {
                    entity,
                    table: (record.position.x, record.position.y),
                    indexed: stored.map(|p| (p.x, p.y)),
                });
            }
            indexed += usize::from(valid);
        }

        if index.len() > indexed {
            return Err(TickError::Orphaned {
                count: index.len() - indexed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_spatial::{ChunkKey, SpatialQuery};
    use loam_terrain::{FlatTerrain, TileKind};

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
    fn mismatched_chunk_sizes_rejected() {
        let result = World::new(
            SpatialIndex::new(ChunkSize::new(16).unwrap()),
            MemoryChunkStore::new(ChunkSize::new(32).unwrap(), FlatTerrain(TileKind::Grass)),
            1.0,
        );

        assert_eq!(
            result.err(),
            Some(TickError::ChunkSizeMismatch {
                index: 16,
                terrain: 32
            })
        );
    }

    #[test]
    fn lifecycle_reaches_index() {
        let mut world = world();
        let handle = world.spatial_handle();

        let e = world.spawn(Position::new(1.0, 1.0), Tags::AGENT);
        assert_eq!(handle.read().chunk_of(e), Some(ChunkKey::new(0, 0)));

        world.set_position(e, Position::new(40.0, 1.0));
        assert_eq!(handle.read().chunk_of(e), Some(ChunkKey::new(1, 0)));

        world.set_tags(e, Tags::AGENT | Tags::HEAT_SOURCE);
        assert_eq!(
            handle.query_nearest_of_tag(Position::new(40.0, 1.0), Tags::HEAT_SOURCE, 1.0),
            Ok(Some(e))
        );

        world.despawn(e);
        assert!(handle.read().is_empty());
        world.verify_index().unwrap();
    }

    #[test]
    fn invalid_position_kept_in_table_but_not_index() {
        let mut world = world();
        let e = world.spawn(Position::new(f64::NAN, 0.0), Tags::AGENT);

        assert!(world.get(e).is_some());
        assert!(!world.spatial_handle().read().contains(e));
        world.verify_index().unwrap();

        world.set_position(e, Position::new(3.0, 3.0));
        assert!(world.spatial_handle().read().contains(e));
        world.verify_index().unwrap();
    }

    #[test]
    fn verify_detects_out_of_band_index_write() {
        let mut world = world();
        let e = world.spawn(Position::new(1.0, 1.0), Tags::AGENT);

        // A caller bypassing `set_position`.
        world.spatial_handle().write().remove(e);

        assert!(matches!(
            world.verify_index(),
            Err(TickError::OutOfSync { .. })
        ));
    }
}
