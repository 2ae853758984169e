use std::time::Duration;

use crate::timer::Timer;

/// Fixed-duration countdown against a [`Timer`].
///
/// Owns a clone of the timer so it can live inside long-lived state without
/// borrowing it.
#[derive(Debug, Clone)]
pub struct CountDown<T: Timer> {
    timer: T,
    start: T::Timestamp,
    duration: Duration,
}

impl<T: Timer> CountDown<T> {
    pub fn new(timer: T, duration: Duration) -> Self {
        let start = timer.now();
        Self {
            timer,
            start,
            duration,
        }
    }

    /// True while the countdown has not yet expired.
    pub fn counting(&self) -> bool {
        self.timer.elapsed(self.start) < self.duration
    }

    /// Time since the countdown started.
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed(self.start)
    }

    /// Restart from now with the same duration.
    pub fn reset(&mut self) {
        self.start = self.timer.now();
    }
}
