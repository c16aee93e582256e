//! Behavior systems that consume spatial queries and tile reads.
//!
//! Each spatial consumer owns a [`Proximity`] binding. Wired, it queries the
//! chunk index; unwired, it falls back to [`LinearScan`]. Results are the
//! same either way. Tile reads go through the world's generation guard and
//! treat an ungenerated chunk as "no data this tick".

mod building;
mod consumer;
mod foraging;
mod proximity;
mod swimming;
mod temperature;
mod vision;

pub use building::{BuildOutcome, BuildRequest, BuildingSystem, RejectReason};
pub use consumer::SpatialConsumer;
pub use foraging::ForagingSystem;
pub use proximity::{LinearScan, Proximity};
pub use swimming::SwimmingSystem;
pub use temperature::TemperatureSystem;
pub use vision::{Sighting, VisionSystem};

pub mod prelude {
    pub use crate::{Proximity, SpatialConsumer};
}
