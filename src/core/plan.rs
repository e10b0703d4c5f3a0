//! Dimming plan: the brightness steps between sunset and sleep time.
//!
//! A plan is a pure function of the sunset instant, the sleep time-of-day and the
//! brightness range. The window from sunset to sleep time is cut into
//! `high - low` equal chunks using integer (floor) division of the window's
//! seconds, so the last step may land a few seconds before the nominal sleep
//! time. That truncation is kept on purpose.

use chrono::{DateTime, Duration, Local, NaiveTime};

use super::ScheduleError;
use crate::time_source::combine_local;

/// Brightness bounds for one day: full at sunset, `low` by sleep time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRange {
    high: u8,
    low: u8,
}

impl BrightnessRange {
    /// Fails with `ScheduleError::InvalidRange` unless `high > low`.
    pub fn new(high: u8, low: u8) -> Result<Self, ScheduleError> {
        if high <= low {
            return Err(ScheduleError::InvalidRange { high, low });
        }
        Ok(Self { high, low })
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    /// Number of one-unit dimming steps.
    pub fn chunk_count(&self) -> u32 {
        u32::from(self.high - self.low)
    }
}

/// One scheduled brightness change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimStep {
    pub fire_at: DateTime<Local>,
    pub brightness: u8,
}

/// The full set of steps for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimPlan {
    anchor: DimStep,
    steps: Vec<DimStep>,
    sleep_at: DateTime<Local>,
    seconds_per_chunk: i64,
}

impl DimPlan {
    /// Build the plan for the day `sunset` falls on.
    ///
    /// The anchor step (power on at `high`) is always present at exactly `sunset`.
    /// When the sleep time is at or before sunset the plan has no dimming steps.
    pub fn compute(sunset: DateTime<Local>, sleep_time: NaiveTime, range: BrightnessRange) -> Self {
        let sleep_at = combine_local(sunset.date_naive(), sleep_time).unwrap_or(sunset);
        let total_dim_seconds = (sleep_at - sunset).num_seconds();
        let chunk_count = i64::from(range.chunk_count());

        let anchor = DimStep {
            fire_at: sunset,
            brightness: range.high(),
        };

        if total_dim_seconds <= 0 {
            return Self {
                anchor,
                steps: Vec::new(),
                sleep_at,
                seconds_per_chunk: 0,
            };
        }

        let seconds_per_chunk = total_dim_seconds.div_euclid(chunk_count);
        let steps = (1..=range.chunk_count())
            .map(|i| DimStep {
                fire_at: sunset + Duration::seconds(seconds_per_chunk * i64::from(i)),
                // i <= high - low, so this never underflows
                brightness: range.high() - i as u8,
            })
            .collect();

        Self {
            anchor,
            steps,
            sleep_at,
            seconds_per_chunk,
        }
    }

    /// The power-on step at sunset.
    pub fn anchor(&self) -> &DimStep {
        &self.anchor
    }

    /// Dimming steps in firing order, excluding the anchor.
    pub fn steps(&self) -> &[DimStep] {
        &self.steps
    }

    pub fn sunset(&self) -> DateTime<Local> {
        self.anchor.fire_at
    }

    /// The nominal instant by which `low` should be reached.
    pub fn sleep_at(&self) -> DateTime<Local> {
        self.sleep_at
    }

    pub fn seconds_per_chunk(&self) -> i64 {
        self.seconds_per_chunk
    }

    /// True when sunset is at or after sleep time and nothing dims today.
    pub fn is_degenerate(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::parse_datetime;
    use chrono::Timelike;

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    fn hms(dt: DateTime<Local>) -> (u32, u32, u32) {
        (dt.hour(), dt.minute(), dt.second())
    }

    #[test]
    fn test_range_rejects_high_not_above_low() {
        assert_eq!(
            BrightnessRange::new(10, 10),
            Err(ScheduleError::InvalidRange { high: 10, low: 10 })
        );
        assert!(BrightnessRange::new(1, 100).is_err());
        assert_eq!(BrightnessRange::new(100, 1).unwrap().chunk_count(), 99);
    }

    #[test]
    fn test_scenario_tel_aviv_evening() {
        let sunset = parse_datetime("2024-01-15 17:45:00").unwrap();
        let range = BrightnessRange::new(100, 1).unwrap();

        let plan = DimPlan::compute(sunset, time("22:00:00"), range);

        // 4h15m = 15300s over 99 chunks
        assert_eq!(plan.seconds_per_chunk(), 154);
        assert_eq!(plan.steps().len(), 99);
        assert_eq!(plan.anchor().fire_at, sunset);
        assert_eq!(plan.anchor().brightness, 100);

        let first = plan.steps()[0];
        assert_eq!(hms(first.fire_at), (17, 47, 34));
        assert_eq!(first.brightness, 99);

        let last = plan.steps()[98];
        assert_eq!(hms(last.fire_at), (21, 59, 6));
        assert_eq!(last.brightness, 1);
        assert!(last.fire_at <= plan.sleep_at());
    }

    #[test]
    fn test_sunset_after_sleep_time_has_only_anchor() {
        let sunset = parse_datetime("2024-06-20 22:30:00").unwrap();
        let plan = DimPlan::compute(sunset, time("22:00:00"), BrightnessRange::new(100, 1).unwrap());

        assert!(plan.is_degenerate());
        assert!(plan.steps().is_empty());
        assert_eq!(hms(plan.anchor().fire_at), (22, 30, 0));
    }

    #[test]
    fn test_sunset_equal_to_sleep_time_has_only_anchor() {
        let sunset = parse_datetime("2024-06-20 22:00:00").unwrap();
        let plan = DimPlan::compute(sunset, time("22:00:00"), BrightnessRange::new(100, 1).unwrap());
        assert!(plan.is_degenerate());
    }

    #[test]
    fn test_single_chunk_fires_at_sleep_time() {
        let sunset = parse_datetime("2024-01-15 17:45:00").unwrap();
        let plan = DimPlan::compute(sunset, time("22:00:00"), BrightnessRange::new(2, 1).unwrap());

        assert_eq!(plan.steps().len(), 1);
        assert_eq!(plan.steps()[0].fire_at, sunset + Duration::seconds(15300));
        assert_eq!(plan.steps()[0].brightness, 1);
    }

    #[test]
    fn test_tiny_window_steps_coincide() {
        // 30 seconds cannot be split into 99 whole-second chunks
        let sunset = parse_datetime("2024-01-15 21:59:30").unwrap();
        let plan = DimPlan::compute(sunset, time("22:00:00"), BrightnessRange::new(100, 1).unwrap());

        assert_eq!(plan.seconds_per_chunk(), 0);
        assert_eq!(plan.steps().len(), 99);
        assert!(plan.steps().iter().all(|s| s.fire_at == sunset));
        assert_eq!(plan.steps().last().map(|s| s.brightness), Some(1));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let sunset = parse_datetime("2024-01-15 17:45:00").unwrap();
        let range = BrightnessRange::new(80, 20).unwrap();
        assert_eq!(
            DimPlan::compute(sunset, time("23:15:00"), range),
            DimPlan::compute(sunset, time("23:15:00"), range)
        );
    }
}
