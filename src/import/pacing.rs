//! Pacing strategies applied between content-store writes.

use std::cell::Cell;
use std::time::Duration;

use tracing::debug;

use crate::config::ThrottleConfig;

pub trait Pacer {
    /// Called after every completed write.
    fn after_write(&self);
}

/// Writes proceed at full speed.
pub struct NoPacing;

impl Pacer for NoPacing {
    fn after_write(&self) {}
}

/// Sleeps for `delay` after every `every` writes.
pub struct FixedDelay {
    every: usize,
    delay: Duration,
    writes: Cell<usize>,
}

impl FixedDelay {
    pub fn new(every: usize, delay: Duration) -> Self {
        Self {
            every: every.max(1),
            delay,
            writes: Cell::new(0),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.every, config.delay())
    }

    /// Whether the write just recorded should be followed by a pause.
    fn record_write(&self) -> bool {
        let writes = self.writes.get() + 1;
        self.writes.set(writes);
        writes % self.every == 0
    }
}

impl Pacer for FixedDelay {
    fn after_write(&self) {
        if self.record_write() && !self.delay.is_zero() {
            debug!("Pausing {:?} after {} writes", self.delay, self.writes.get());
            std::thread::sleep(self.delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_fixed_delay_pauses_every_n_writes() {
        let pacer = FixedDelay::new(3, Duration::ZERO);
        let pauses: Vec<bool> = (0..7).map(|_| pacer.record_write()).collect();
        assert_eq!(pauses, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn test_fixed_delay_zero_every_is_clamped() {
        let pacer = FixedDelay::new(0, Duration::ZERO);
        assert!(pacer.record_write());
        assert!(pacer.record_write());
    }

    #[test]
    fn test_fixed_delay_sleeps() {
        let pacer = FixedDelay::new(1, Duration::from_millis(20));
        let start = Instant::now();
        pacer.after_write();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_from_config() {
        let pacer = FixedDelay::from_config(&ThrottleConfig {
            every: 2,
            delay_ms: 0,
        });
        assert!(!pacer.record_write());
        assert!(pacer.record_write());
    }
}
