//! Clock capability
//!
//! Date-dependent projections (program progress, session expiry) read the
//! current date through a [`Clock`] handed to them instead of calling
//! `Utc::now()` themselves.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of `now()`, no time zone adjustment applied
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Shared clock handle stored in application state
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Midnight UTC of the given date
    pub fn on(date: NaiveDate) -> Self {
        Self {
            instant: date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let clock = FixedClock::on(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_is_shareable() {
        let clock: SharedClock = Arc::new(SystemClock);
        assert!(clock.today() >= NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
