//! Tick-level error types.

use loam_entity::Entity;
use loam_spatial::CoherenceError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    /// The index and the terrain store disagree on chunk size.
    #[error("chunk size mismatch: index uses {index}, terrain uses {terrain}")]
    ChunkSizeMismatch { index: u32, terrain: u32 },

    #[error("spatial index incoherent: {0}")]
    Incoherent(#[from] CoherenceError),

    /// The index holds a position different from the entity table's.
    #[error("index out of sync for {entity}: table {table:?}, index {indexed:?}")]
    OutOfSync {
        entity: Entity,
        table: (f64, f64),
        indexed: Option<(f64, f64)>,
    },

    /// The index holds an entity the table no longer has.
    #[error("index holds {count} more entities than the entity table")]
    Orphaned { count: usize },
}

pub type TickResult<T> = Result<T, TickError>;
