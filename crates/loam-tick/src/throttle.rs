//! Run-every-N-ticks gating.

/// Lets a consumer run once every `interval` ticks.
///
/// Throttling bounds the average cost of a consumer across ticks. It does
/// nothing for the tick on which the consumer does run, so it is never a
/// substitute for keeping each call cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    interval: u64,
    offset: u64,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::every_tick()
    }
}

impl Throttle {
    /// `interval` of zero is treated as one.
    #[must_use]
    pub const fn new(interval: u64, offset: u64) -> Self {
        let interval = if interval == 0 { 1 } else { interval };
        Self {
            interval,
            offset: offset % interval,
        }
    }

    #[must_use]
    pub const fn every_tick() -> Self {
        Self::new(1, 0)
    }

    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    #[must_use]
    pub const fn ready(&self, tick: u64) -> bool {
        tick % self.interval == self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_every_interval_at_offset() {
        let throttle = Throttle::new(4, 1);
        let fired: Vec<u64> = (0..12).filter(|&t| throttle.ready(t)).collect();

        assert_eq!(fired, vec![1, 5, 9]);
    }

    #[test]
    fn zero_interval_is_every_tick() {
        let throttle = Throttle::new(0, 3);

        assert!((0..5).all(|t| throttle.ready(t)));
        assert_eq!(throttle, Throttle::every_tick());
    }
}
