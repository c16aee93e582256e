//! Chunk-based spatial index.
//!
//! The world is an infinite tile plane cut into square chunks. Every indexed
//! entity lives in exactly one [`ChunkBucket`], the one keyed by the
//! [`ChunkKey`] of its current position. Radius queries only visit the
//! bounded window of chunks the radius can reach and then apply an exact
//! circle test, so their cost does not grow with the total entity count.
//!
//! ```text
//!   lifecycle / movement ──► SpatialIndex (bucket maintenance)
//!                                  │
//!                                  ▼
//!                           SpatialQuery (read-only)
//!                                  │
//!                                  ▼
//!                           behavior systems
//! ```
//!
//! The index is single-writer: mutation for a tick completes before any
//! query for that tick runs. [`SharedIndex`] is the handle systems hold.

mod bucket;
mod coherence;
mod config;
mod error;
mod index;
mod key;
mod query;
mod shared;

pub use bucket::{ChunkBucket, Resident};
pub use coherence::CoherenceError;
pub use config::SpatialConfig;
pub use error::{SpatialError, SpatialResult};
pub use index::{EntityLifecycle, IndexStats, Placement, SpatialIndex};
pub use key::{ChunkKey, ChunkSize, ChunkWindow};
pub use query::{Nearest, SpatialQuery, radius_squared};
pub use shared::SharedIndex;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChunkKey, ChunkSize, EntityLifecycle, Placement, SharedIndex, SpatialIndex, SpatialQuery,
    };
}
