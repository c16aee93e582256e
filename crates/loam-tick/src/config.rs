//! Tick configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulated seconds per tick.
    pub dt: f64,
    /// Wall-clock budget per tick in milliseconds; ticks over it are logged.
    pub budget_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            dt: 0.05,
            budget_ms: 50,
        }
    }
}

impl TickConfig {
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}
