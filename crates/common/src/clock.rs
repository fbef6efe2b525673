//! Wall-clock access.
//!
//! The compositor stamps the current date onto every composite and the
//! export adapter names downloads after the current time. Both read time
//! through the [`Clock`] trait so tests can pin it.

use chrono::{DateTime, Datelike, Local, TimeZone};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> DateTime<Local>;

    /// Milliseconds since the Unix epoch.
    fn unix_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Date stamp in `M/D/YYYY` form.
    fn date_stamp(&self) -> String {
        format_date_stamp(&self.now())
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Local>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Local>) -> Self {
        Self { instant }
    }

    /// Freeze at local midnight of the given calendar date.
    ///
    /// Returns `None` for dates that do not exist.
    pub fn at_date(year: i32, month: u32, day: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .earliest()
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.instant
    }
}

/// Format a date the way the booth stamps it: month/day/year, no padding.
pub fn format_date_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{}/{}/{}", at.month(), at.day(), at.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_stamp_is_unpadded() {
        let clock = FixedClock::at_date(2024, 3, 7).unwrap();
        assert_eq!(clock.date_stamp(), "3/7/2024");
    }

    #[test]
    fn fixed_clock_does_not_advance() {
        let clock = FixedClock::at_date(2023, 12, 31).unwrap();
        assert_eq!(clock.unix_millis(), clock.unix_millis());
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().year() >= 2020);
    }
}
