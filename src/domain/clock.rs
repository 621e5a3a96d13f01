//! Time source for audit timestamps.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Supplies the current time to the service layer.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Each read advances it by `step`
/// so successive timestamps are strictly increasing.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// Starts at `start`, advancing one second per read.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
            step: Duration::seconds(1),
        }
    }

    /// Jumps the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.current.lock() {
            Ok(mut current) => {
                let now = *current;
                *current += self.step;
                now
            }
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
