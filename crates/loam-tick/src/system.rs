//! The unit of per-tick work.

use crate::World;

/// Scheduling phase. All `Update` systems run before any `Decision` system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Mutates positions and other state the index mirrors.
    Update,
    /// Reads the world through spatial queries and acts on it.
    Decision,
}

pub trait System {
    fn name(&self) -> &'static str;

    fn phase(&self) -> Phase;

    /// Lower runs first within a phase.
    fn priority(&self) -> i32 {
        0
    }

    fn run(&mut self, world: &mut World);
}
