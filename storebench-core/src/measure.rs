//! Epoch Timing
//!
//! Wall-clock timing of the measured window around `execute()`.
//! Backed by `tokio::time::Instant`, which is the monotonic high-resolution
//! clock unless the runtime clock is paused (tests), where it follows the
//! virtual clock instead.

use std::time::Duration;
use tokio::time::Instant;

/// Timer covering exactly one measured window
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start timing
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop timing and return the elapsed duration
    #[inline]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time so far without consuming the timer
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Duration as fractional seconds (sub-millisecond precision kept)
#[inline]
pub fn as_secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

/// Duration as fractional milliseconds
#[inline]
pub fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
