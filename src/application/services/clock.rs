//! # Clock
//!
//! Time source injected into the application services.
//!
//! Production code uses [`SystemClock`]. Tests use [`ManualClock`] to step
//! time past listing deadlines deterministically.

use crate::domain::value_objects::Timestamp;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jumps to `instant`.
    pub fn set(&self, instant: Timestamp) {
        *self.now.lock() = instant;
    }

    /// Moves forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now = now.add_secs(secs);
    }

    /// Moves forward by `days` days.
    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock();
        *now = now.add_days(days);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
