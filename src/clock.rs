//! Wall clock abstraction
//!
//! Energy integration and slot boundaries read "now" exclusively through
//! [`Clock`], so tests can move time forward without sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Time elapsed since `t`; negative if the clock went backwards
    fn since(&self, t: DateTime<Utc>) -> Duration {
        self.now() - t
    }
}

/// Real time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock by `d` (which may be negative)
    pub fn add(&self, d: Duration) {
        let mut now = self.now.lock();
        *now += d;
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.now.lock() = t;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mock_clock_advances_shared_time() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = MockClock::new(start);
        let view = clock.clone();

        clock.add(Duration::minutes(15));
        assert_eq!(view.now(), start + Duration::minutes(15));
        assert_eq!(view.since(start), Duration::minutes(15));

        clock.set(start - Duration::minutes(1));
        assert!(view.since(start) < Duration::zero());
    }
}
