//! Fixed-timestep world and sequential system scheduling.
//!
//! # Tick Execution Model
//!
//! ```text
//! Tick N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Update phase    movement, terrain streaming                │
//! │                  (every position change reaches the index)  │
//! │  Decision phase  vision, foraging, temperature, ...         │
//! │                  (read-only spatial queries)                │
//! │  Report          per-system timings, budget warning         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Systems run one at a time in `(phase, priority, registration)` order, so
//! all index mutation of a tick completes before any query of that tick.

mod config;
mod error;
mod movement;
mod scheduler;
mod streaming;
mod system;
mod throttle;
mod world;

pub use config::TickConfig;
pub use error::{TickError, TickResult};
pub use movement::MovementSystem;
pub use scheduler::{Scheduler, SystemTiming, TickReport};
pub use streaming::TerrainStreamingSystem;
pub use system::{Phase, System};
pub use throttle::Throttle;
pub use world::World;

pub mod prelude {
    pub use crate::{Phase, Scheduler, System, Throttle, World};
}
