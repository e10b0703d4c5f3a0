//! Sunrise and sunset for a fixed coordinate, in the process's local time zone.

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike, Utc};
use std::sync::Arc;
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::Coordinate;
use crate::core::ScheduleError;
use crate::time_source::TimeSource;

/// Standard apparent altitude of the sun's upper limb at rise/set, in degrees.
const HORIZON_ALTITUDE_DEG: f64 = -0.833;

/// Answers "when does the sun set (or rise) here on this date".
pub struct SolarClock {
    coordinate: Coordinate,
    clock: Arc<dyn TimeSource>,
}

impl SolarClock {
    pub fn new(coordinate: Coordinate, clock: Arc<dyn TimeSource>) -> Self {
        Self { coordinate, clock }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Local sunset for `date`, or for today when `date` is `None`.
    pub fn sunset_at(&self, date: Option<NaiveDate>) -> Result<DateTime<Local>, ScheduleError> {
        self.event_at(date, SolarEvent::Sunset)
    }

    /// Local sunrise for `date`, or for today when `date` is `None`.
    pub fn sunrise_at(&self, date: Option<NaiveDate>) -> Result<DateTime<Local>, ScheduleError> {
        self.event_at(date, SolarEvent::Sunrise)
    }

    fn event_at(
        &self,
        date: Option<NaiveDate>,
        event: SolarEvent,
    ) -> Result<DateTime<Local>, ScheduleError> {
        let date = date.unwrap_or_else(|| self.clock.now().date_naive());
        let Coordinate {
            latitude,
            longitude,
        } = self.coordinate;
        let fail = |reason: String| ScheduleError::Geolocation {
            latitude,
            longitude,
            date,
            reason,
        };

        if let Some(reason) = polar_condition(latitude, date) {
            return Err(fail(reason));
        }

        let coord = Coordinates::new(latitude, longitude)
            .ok_or_else(|| fail("coordinates out of range".to_string()))?;
        let utc: DateTime<Utc> = SolarDay::new(coord, date).event_time(event);

        // A diverging hour angle collapses to the epoch instead of failing.
        if (utc.date_naive() - date).num_days().abs() > 1 {
            return Err(fail(format!(
                "solar calculation did not converge (got {})",
                utc.format("%Y-%m-%d %H:%M:%S UTC")
            )));
        }

        let local = utc.with_timezone(&Local);
        Ok(local.with_nanosecond(0).unwrap_or(local))
    }
}

/// Detect polar day/night: the sun never crosses the horizon altitude.
///
/// Uses the cosine approximation of solar declination, good to a fraction of a
/// degree, which is enough to tell "no event" apart from "late event".
fn polar_condition(latitude: f64, date: NaiveDate) -> Option<String> {
    let day_of_year = f64::from(date.ordinal());
    let declination =
        (-23.44_f64).to_radians() * ((360.0 / 365.0) * (day_of_year + 10.0)).to_radians().cos();
    let phi = latitude.to_radians();

    let denominator = phi.cos() * declination.cos();
    if denominator.abs() < f64::EPSILON {
        return Some("sun does not rise or set at the pole".to_string());
    }

    let cos_hour_angle =
        (HORIZON_ALTITUDE_DEG.to_radians().sin() - phi.sin() * declination.sin()) / denominator;

    if cos_hour_angle > 1.0 {
        Some("polar night: the sun stays below the horizon".to_string())
    } else if cos_hour_angle < -1.0 {
        Some("midnight sun: the sun stays above the horizon".to_string())
    } else {
        None
    }
}
