use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Timer for measuring operation latency
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed time without stopping the timer
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Wall-clock access. Never used for ordering orders; the book's sequence
/// counter does that.
pub struct Clock;

impl Clock {
    /// Current UTC time
    pub fn now_utc() -> DateTime<Utc> {
        Utc::now()
    }
}
