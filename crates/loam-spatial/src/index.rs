//! Bucket maintenance.
//!
//! The index is driven by explicit lifecycle calls from the owning
//! simulation (create, destroy, move). Maintenance cost is proportional to
//! the number of entities that actually changed, never to the population.

use hashbrown::HashMap;
use loam_entity::{Entity, Position, Tags};
use tracing::{debug, warn};

use crate::{ChunkBucket, ChunkKey, ChunkSize, Resident, SpatialConfig, SpatialResult};

/// Outcome of an index mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Entity entered the index in this chunk.
    Inserted(ChunkKey),
    /// Entity stayed in its chunk; only its stored position changed.
    Unchanged(ChunkKey),
    /// Entity crossed a chunk boundary.
    Relocated { from: ChunkKey, to: ChunkKey },
    /// Position was non-finite or out of range; the entity is not indexed.
    Rejected,
    /// Entity is not known to the index.
    Missing,
}

/// Running counters, useful for tick telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub inserts: u64,
    pub removes: u64,
    pub chunk_crossings: u64,
    pub intra_chunk_moves: u64,
    pub rejected: u64,
}

/// Notifications from the entity lifecycle of the owning simulation.
pub trait EntityLifecycle {
    fn on_entity_created(&mut self, entity: Entity, position: Position, tags: Tags);
    fn on_entity_destroyed(&mut self, entity: Entity);
    fn on_entity_moved(&mut self, entity: Entity, old: Position, new: Position);
}

/// Chunk-bucketed index of entity positions.
///
/// Invariant: every indexed entity sits in exactly one bucket, the one for
/// `chunk_size.key_of(position)`. Each mutation restores it before
/// returning. See [`SpatialIndex::verify_coherence`].
#[derive(Debug)]
pub struct SpatialIndex {
    pub(crate) chunk_size: ChunkSize,
    pub(crate) prune_empty: bool,
    pub(crate) buckets: HashMap<ChunkKey, ChunkBucket>,
    pub(crate) residents: HashMap<Entity, ChunkKey>,
    /// Entities excluded for an invalid position, with their tags, so a
    /// later move back to a valid position re-admits them.
    quarantined: HashMap<Entity, Tags>,
    stats: IndexStats,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(ChunkSize::default())
    }
}

impl SpatialIndex {
    #[must_use]
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self {
            chunk_size,
            prune_empty: true,
            buckets: HashMap::new(),
            residents: HashMap::new(),
            quarantined: HashMap::new(),
            stats: IndexStats::default(),
        }
    }

    pub fn from_config(config: &SpatialConfig) -> SpatialResult<Self> {
        let mut index = Self::new(config.chunk_size()?);
        index.prune_empty = config.prune_empty_buckets;
        Ok(index)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    // ==================== Mutation ====================

    /// Indexes `entity` at `position`.
    ///
    /// Re-inserting at the same chunk only refreshes position and tags; an
    /// entity already resident elsewhere is relocated, never duplicated.
    pub fn insert(&mut self, entity: Entity, position: Position, tags: Tags) -> Placement {
        let Some(key) = self.chunk_size.key_of(position) else {
            self.quarantine(entity, position, tags);
            return Placement::Rejected;
        };
        self.quarantined.remove(&entity);

        let resident = Resident { position, tags };
        match self.residents.get(&entity).copied() {
            Some(current) if current == key => {
                self.bucket_mut(key).insert(entity, resident);
                Placement::Unchanged(key)
            }
            Some(current) => {
                self.detach(entity, current);
                self.attach(entity, key, resident);
                self.stats.chunk_crossings += 1;
                Placement::Relocated {
                    from: current,
                    to: key,
                }
            }
            None => {
                self.attach(entity, key, resident);
                self.stats.inserts += 1;
                Placement::Inserted(key)
            }
        }
    }

    /// Drops `entity` from the index. No-op for unknown entities.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let quarantined = self.quarantined.remove(&entity).is_some();
        let Some(key) = self.residents.get(&entity).copied() else {
            return quarantined;
        };
        self.detach(entity, key);
        self.stats.removes += 1;
        true
    }

    /// Applies a position change.
    ///
    /// Intra-chunk moves touch no bucket membership. The index's own record
    /// of the current chunk is authoritative; an `old` that disagrees with it
    /// means a caller skipped an update and is logged.
    pub fn move_entity(&mut self, entity: Entity, old: Position, new: Position) -> Placement {
        let Some(current) = self.residents.get(&entity).copied() else {
            return match self.quarantined.get(&entity).copied() {
                Some(tags) => self.insert(entity, new, tags),
                None => Placement::Missing,
            };
        };

        if self.chunk_size.key_of(old) != Some(current) {
            warn!(
                %entity,
                old_x = old.x,
                old_y = old.y,
                chunk_x = current.x,
                chunk_y = current.y,
                "stale old position in move; using indexed chunk"
            );
        }

        let Some(target) = self.chunk_size.key_of(new) else {
            let tags = self.detach(entity, current).map_or(Tags::empty(), |r| r.tags);
            self.quarantine(entity, new, tags);
            return Placement::Rejected;
        };

        if target == current {
            self.bucket_mut(current).set_position(entity, new);
            self.stats.intra_chunk_moves += 1;
            return Placement::Unchanged(current);
        }

        let tags = self.detach(entity, current).map_or(Tags::empty(), |r| r.tags);
        self.attach(entity, target, Resident { position: new, tags });
        self.stats.chunk_crossings += 1;
        Placement::Relocated {
            from: current,
            to: target,
        }
    }

    /// Replaces the capability tags of an indexed entity.
    pub fn set_tags(&mut self, entity: Entity, tags: Tags) -> bool {
        if let Some(stored) = self.quarantined.get_mut(&entity) {
            *stored = tags;
            return true;
        }
        let Some(key) = self.residents.get(&entity).copied() else {
            return false;
        };
        let bucket = self.bucket_mut(key);
        let Some(position) = bucket.get(entity).map(|r| r.position) else {
            return false;
        };
        bucket.insert(entity, Resident { position, tags });
        true
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.residents.clear();
        self.quarantined.clear();
    }

    // ==================== Access ====================

    /// Entities currently in the bucket at `key`.
    pub fn bucket_at(&self, key: ChunkKey) -> impl Iterator<Item = Entity> + '_ {
        self.buckets
            .get(&key)
            .into_iter()
            .flat_map(ChunkBucket::entities)
    }

    #[must_use]
    pub fn bucket(&self, key: ChunkKey) -> Option<&ChunkBucket> {
        self.buckets.get(&key)
    }

    /// Chunks holding at least one entity (or retained empty buckets when
    /// pruning is off).
    pub fn occupied_chunks(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.buckets.keys().copied()
    }

    #[must_use]
    pub fn chunk_of(&self, entity: Entity) -> Option<ChunkKey> {
        self.residents.get(&entity).copied()
    }

    #[must_use]
    pub fn resident(&self, entity: Entity) -> Option<&Resident> {
        let key = self.residents.get(&entity)?;
        self.buckets.get(key)?.get(entity)
    }

    #[must_use]
    pub fn position_of(&self, entity: Entity) -> Option<Position> {
        self.resident(entity).map(|r| r.position)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.residents.contains_key(&entity)
    }

    /// Whether `entity` is known but excluded for an invalid position.
    #[must_use]
    pub fn is_quarantined(&self, entity: Entity) -> bool {
        self.quarantined.contains_key(&entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.residents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub const fn stats(&self) -> IndexStats {
        self.stats
    }

    // ==================== Internals ====================

    fn bucket_mut(&mut self, key: ChunkKey) -> &mut ChunkBucket {
        self.buckets.entry(key).or_default()
    }

    fn attach(&mut self, entity: Entity, key: ChunkKey, resident: Resident) {
        self.bucket_mut(key).insert(entity, resident);
        self.residents.insert(entity, key);
    }

    fn detach(&mut self, entity: Entity, key: ChunkKey) -> Option<Resident> {
        self.residents.remove(&entity);
        let bucket = self.buckets.get_mut(&key)?;
        let resident = bucket.remove(entity);
        if self.prune_empty && bucket.is_empty() {
            self.buckets.remove(&key);
            debug!(chunk_x = key.x, chunk_y = key.y, "pruned empty bucket");
        }
        resident
    }

    fn quarantine(&mut self, entity: Entity, position: Position, tags: Tags) {
        if let Some(key) = self.residents.get(&entity).copied() {
            self.detach(entity, key);
        }
        self.quarantined.insert(entity, tags);
        self.stats.rejected += 1;
        warn!(
            %entity,
            x = position.x,
            y = position.y,
            "excluding entity with invalid position from spatial index"
        );
    }
}

impl EntityLifecycle for SpatialIndex {
    fn on_entity_created(&mut self, entity: Entity, position: Position, tags: Tags) {
        self.insert(entity, position, tags);
    }

    fn on_entity_destroyed(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn on_entity_moved(&mut self, entity: Entity, old: Position, new: Position) {
        self.move_entity(entity, old, new);
    }
}
