//! Entities of the loam world.
//!
//! The simulation owns its entities; everything else (the spatial index,
//! behavior systems) refers to them by [`Entity`] and reads their
//! [`EntityRecord`] through the [`EntityStore`].
//!
//! # Key Concepts
//!
//! - **Entity**: generational identifier, safe to hold across despawns
//! - **Tags**: closed bitset of capabilities used to filter spatial queries
//! - **Position**: two-dimensional world coordinates in tile units

mod entity;
mod position;
mod store;
mod tags;

pub use entity::{Entity, EntityAllocator, EntityId, Generation};
pub use position::{Position, Velocity};
pub use store::{EntityRecord, EntityStore};
pub use tags::Tags;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Entity, EntityRecord, EntityStore, Position, Tags, Velocity};
}
