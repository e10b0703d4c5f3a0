//! Geographic location and solar event calculations.
//!
//! - [`solar`]: [`SolarClock`], sunrise/sunset for the configured coordinate with
//!   polar-region detection surfaced as `ScheduleError::Geolocation`.

pub mod solar;

pub use solar::SolarClock;

#[cfg(test)]
mod tests;

/// Geographic coordinate in degrees. Immutable once configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.3}°{}, {:.3}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}
