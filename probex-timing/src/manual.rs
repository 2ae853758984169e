use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::timer::Timer;

/// Manually advanced clock for simulations and tests.
///
/// Clones share the same underlying clock, so a countdown or state machine
/// holding a clone observes every [`ManualTimer::advance`].
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    /// Sleeping in simulated time just advances the clock.
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_visible_through_clones() {
        let timer = ManualTimer::new();
        let clone = timer.clone();
        let ts = clone.now();

        timer.advance(Duration::from_millis(7));
        assert_eq!(clone.elapsed(ts), Duration::from_millis(7));
    }

    #[test]
    fn sleep_advances_the_clock() {
        let timer = ManualTimer::new();
        let ts = timer.now();
        timer.sleep(Duration::from_micros(250));
        assert_eq!(timer.elapsed(ts), Duration::from_micros(250));
    }
}
