//! Time sources driving animation progress.
//!
//! All timestamps are milliseconds as `f64`. A time source must never go
//! backwards.

use std::cell::Cell;

use tokio::time::Instant;

/// Monotonic timestamp provider.
pub trait TimeSource {
    /// Current time in milliseconds.
    fn now(&self) -> f64;
}

/// Wall clock measured from the moment it was created.
///
/// Backed by `tokio::time::Instant`, so a paused tokio clock (as used in
/// tests) is honoured.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic hosts and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Move the clock forward by `delta_ms`. Negative deltas are ignored.
    pub fn advance(&self, delta_ms: f64) {
        if delta_ms > 0.0 {
            self.now.set(self.now.get() + delta_ms);
        }
    }

    /// Jump to `time_ms`, refusing to go backwards.
    pub fn set(&self, time_ms: f64) {
        if time_ms > self.now.get() {
            self.now.set(time_ms);
        }
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
