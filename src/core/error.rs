//! Error taxonomy for planning and scheduling.
//!
//! These travel inside `anyhow::Error`; callers that need to tell them apart
//! use `downcast_ref::<ScheduleError>()`.

use chrono::NaiveDate;
use std::fmt;

/// Failures that stop a day's plan from being built.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Sunrise/sunset cannot be computed for the coordinate on this date
    /// (polar day or night, or a non-converging solar calculation).
    Geolocation {
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        reason: String,
    },
    /// The brightness range has no room to dim: `high` must exceed `low`.
    InvalidRange { high: u8, low: u8 },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Geolocation {
                latitude,
                longitude,
                date,
                reason,
            } => write!(
                f,
                "cannot compute sun times for {latitude:.4}, {longitude:.4} on {date}: {reason}"
            ),
            ScheduleError::InvalidRange { high, low } => write!(
                f,
                "brightness_high ({high}) must be greater than brightness_low ({low})"
            ),
        }
    }
}

impl std::error::Error for ScheduleError {}
