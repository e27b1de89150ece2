//! A clock for stamping when expenses are recorded.

use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;

/// A UTC clock that never goes backwards within the process.
///
/// If the system clock is set back, [MonotonicClock::now] keeps returning the
/// latest time it has handed out until the system clock catches up.
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    latest: Arc<Mutex<Option<OffsetDateTime>>>,
}

impl MonotonicClock {
    /// Create a clock that has not handed out any times yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current UTC time, or the latest time handed out if that is later.
    pub fn now(&self) -> OffsetDateTime {
        self.tick(OffsetDateTime::now_utc())
    }

    fn tick(&self, wall_time: OffsetDateTime) -> OffsetDateTime {
        // A plain timestamp cannot be left half-written, so poisoning is harmless.
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);

        let now = match *latest {
            Some(previous) if previous > wall_time => previous,
            _ => wall_time,
        };
        *latest = Some(now);

        now
    }
}
