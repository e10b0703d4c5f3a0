//! Time source abstraction for real and simulated clocks.
//!
//! The scheduler and solar clock never call `Local::now()` directly; they are
//! handed a [`TimeSource`]. The daemon uses [`RealTimeSource`], tests use
//! [`ManualTimeSource`], whose `sleep` advances the simulated clock instantly.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveTime, TimeZone};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current local time
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }
}

/// Fast-forward clock: `sleep` jumps time by exactly the requested duration.
pub struct ManualTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Local>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = instant;
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut guard) = self.current.lock() {
            *guard += by;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn sleep(&self, duration: StdDuration) {
        let step = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        self.advance(step);
    }
}

/// Combine a date and a time-of-day in the local zone.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant; times in a
/// spring-forward gap move one hour later.
pub fn combine_local(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + ChronoDuration::hours(1)))
                .earliest()
        })
}

/// Parse a date in the format "YYYY-MM-DD"
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date format: {e}. Use YYYY-MM-DD"))
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as local time
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::NaiveDateTime;

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|naive| {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| "Nonexistent local time".to_string())
        })
}

/// Render a duration as "9h 48m". Negative durations render as "0h 0m".
pub fn format_duration(duration: ChronoDuration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(ChronoDuration::minutes(588)), "9h 48m");
        assert_eq!(format_duration(ChronoDuration::seconds(59)), "0h 0m");
        assert_eq!(format_duration(ChronoDuration::minutes(-5)), "0h 0m");
    }

    #[test]
    fn test_manual_source_sleep_advances_clock() {
        let start = parse_datetime("2024-03-10 12:00:00").unwrap();
        let clock = ManualTimeSource::new(start);

        clock.sleep(StdDuration::from_secs(90));

        let now = clock.now();
        assert_eq!(now.hour(), 12);
        assert_eq!(now.minute(), 1);
        assert_eq!(now.second(), 30);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-06-21"),
            Ok(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap())
        );
        assert!(parse_date("21/06/2024").is_err());
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("tomorrow at noon").is_err());
    }
}
