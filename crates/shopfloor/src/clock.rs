//! Time source for timestamps and calendar-day comparisons.
//!
//! Calendar days are UTC dates formatted as `YYYY-MM-DD`, the same shape
//! as `Project::deadline`.

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date as `YYYY-MM-DD`.
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// A clock pinned to midday (UTC) of the given `YYYY-MM-DD` date.
    /// Returns `None` if the date does not parse.
    pub fn on_date(date: &str) -> Option<Self> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let noon = day.and_hms_opt(12, 0, 0)?;
        Some(Self::new(noon.and_utc()))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = match self.now.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let current = self.now();
        self.set(current + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let clock = FixedClock::on_date("2024-05-01").unwrap();
        assert_eq!(clock.today(), "2024-05-01");

        clock.advance(chrono::Duration::hours(13));
        assert_eq!(clock.today(), "2024-05-02");
    }

    #[test]
    fn test_fixed_clock_rejects_bad_date() {
        assert!(FixedClock::on_date("01/05/2024").is_none());
    }

    #[test]
    fn test_system_clock_today_shape() {
        let today = SystemClock.today();
        assert_eq!(today.len(), 10);
        assert!(NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
    }
}
