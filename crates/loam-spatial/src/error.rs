//! Spatial error types.

use thiserror::Error;

/// Hard errors for inputs no caller should ever pass.
///
/// Ordinary absence (no match in range, unknown entity, empty chunk) is
/// never an error; it shows up as an empty set or `None`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpatialError {
    /// Chunks must be at least one tile wide.
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u32),

    #[error("negative query radius: {0}")]
    NegativeRadius(f64),

    #[error("non-finite query radius: {0}")]
    NonFiniteRadius(f64),

    /// Query center is non-finite or outside the addressable chunk range.
    #[error("invalid query center: ({x}, {y})")]
    InvalidCenter { x: f64, y: f64 },
}

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
