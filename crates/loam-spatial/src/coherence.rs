//! Index coherence checking.
//!
//! The index never repairs itself. These checks exist so tests and the
//! `LOAM_VERIFY` debug mode can catch a caller that skipped a lifecycle call.

use loam_entity::Entity;
use thiserror::Error;

use crate::{ChunkKey, SpatialIndex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoherenceError {
    /// A bucket holds an entity the resident table does not know.
    #[error("entity {entity} is in bucket {chunk} but not registered")]
    Unregistered { entity: Entity, chunk: ChunkKey },

    /// The resident table points at a bucket that does not hold the entity.
    #[error("entity {entity} is registered in {chunk} but missing from its bucket")]
    MissingFromBucket { entity: Entity, chunk: ChunkKey },

    /// The entity sits in a bucket other than the one it is registered in.
    #[error("entity {entity} registered in {registered} but also found in {found}")]
    Duplicated {
        entity: Entity,
        registered: ChunkKey,
        found: ChunkKey,
    },

    /// The bucket key does not match the chunk of the stored position.
    #[error("entity {entity} stored in {chunk} but its position maps to {expected:?}")]
    WrongChunk {
        entity: Entity,
        chunk: ChunkKey,
        expected: Option<ChunkKey>,
    },

    #[error("tag sub-index of bucket {chunk} disagrees with member tags")]
    TagIndex { chunk: ChunkKey },

    #[error("empty bucket {chunk} retained while pruning is enabled")]
    EmptyBucket { chunk: ChunkKey },
}

impl SpatialIndex {
    /// Checks that every indexed entity appears in exactly one bucket, the
    /// one matching its stored position.
    ///
    /// Linear in the number of indexed entities; meant for tests and debug
    /// runs, not for every tick.
    pub fn verify_coherence(&self) -> Result<(), CoherenceError> {
        let mut memberships = 0usize;

        for (&chunk, bucket) in &self.buckets {
            if self.prune_empty && bucket.is_empty() {
                return Err(CoherenceError::EmptyBucket { chunk });
            }
            if !bucket.tag_files_consistent() {
                return Err(CoherenceError::TagIndex { chunk });
            }

            for (entity, resident) in bucket.iter() {
                memberships += 1;
                match self.residents.get(&entity) {
                    None => return Err(CoherenceError::Unregistered { entity, chunk }),
                    Some(&registered) if registered != chunk => {
                        return Err(CoherenceError::Duplicated {
                            entity,
                            registered,
                            found: chunk,
                        });
                    }
                    Some(_) => {}
                }

                let expected = self.chunk_size.key_of(resident.position);
                if expected != Some(chunk) {
                    return Err(CoherenceError::WrongChunk {
                        entity,
                        chunk,
                        expected,
                    });
                }
            }
        }

        for (&entity, &chunk) in &self.residents {
            let present = self
                .buckets
                .get(&chunk)
                .is_some_and(|bucket| bucket.contains(entity));
            if !present {
                return Err(CoherenceError::MissingFromBucket { entity, chunk });
            }
        }

        // Each resident is present in its registered bucket and every
        // membership matched its registration, so counts agreeing rules out
        // any extra copy.
        debug_assert_eq!(memberships, self.residents.len());
        Ok(())
    }
}
