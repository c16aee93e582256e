//! Sequential system scheduler.

use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::{Phase, System, World};

/// Wall-clock time one system took in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTiming {
    pub name: &'static str,
    pub phase: Phase,
    pub elapsed: Duration,
}

/// Telemetry for one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// The tick that ran (before the counter advanced).
    pub tick: u64,
    pub total: Duration,
    pub systems: SmallVec<[SystemTiming; 8]>,
}

impl TickReport {
    #[must_use]
    pub fn slowest(&self) -> Option<&SystemTiming> {
        self.systems.iter().max_by_key(|timing| timing.elapsed)
    }
}

struct Entry {
    phase: Phase,
    priority: i32,
    seq: usize,
    system: Box<dyn System>,
}

/// Runs registered systems once per tick in `(phase, priority,
/// registration)` order.
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: usize,
    budget: Option<Duration>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.names())
            .field("budget", &self.budget)
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
            budget: None,
        }
    }

    /// Logs a warning for ticks slower than `budget`.
    #[must_use]
    pub const fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn add(&mut self, system: impl System + 'static) -> &mut Self {
        self.add_boxed(Box::new(system))
    }

    pub fn add_boxed(&mut self, system: Box<dyn System>) -> &mut Self {
        let entry = Entry {
            phase: system.phase(),
            priority: system.priority(),
            seq: self.next_seq,
            system,
        };
        self.next_seq += 1;

        let key = (entry.phase, entry.priority, entry.seq);
        let at = self
            .entries
            .partition_point(|e| (e.phase, e.priority, e.seq) < key);
        self.entries.insert(at, entry);
        self
    }

    /// System names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.system.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every system once, then advances the world's tick counter.
    pub fn run_tick(&mut self, world: &mut World) -> TickReport {
        let tick = world.tick();
        let start = Instant::now();
        let mut systems = SmallVec::new();

        for entry in &mut self.entries {
            let began = Instant::now();
            entry.system.run(world);
            let elapsed = began.elapsed();

            trace!(tick, system = entry.system.name(), ?elapsed, "system ran");
            systems.push(SystemTiming {
                name: entry.system.name(),
                phase: entry.phase,
                elapsed,
            });
        }

        world.advance_tick();
        let report = TickReport {
            tick,
            total: start.elapsed(),
            systems,
        };

        if let Some(budget) = self.budget {
            if report.total > budget {
                let slowest = report.slowest().map_or("-", |t| t.name);
                warn!(
                    tick,
                    total = ?report.total,
                    ?budget,
                    slowest,
                    "tick over budget"
                );
            }
        }
        report
    }
}
