//! Configuration system for sundim.
//!
//! Settings live in `sundim.toml`, under `$XDG_CONFIG_HOME/sundim/` by default or
//! in the directory passed with `--config`. A commented default file is written
//! on first start.
//!
//! ```toml
//! #[Location]
//! latitude = 32.085300       # Geographic latitude (-90 to 90)
//! longitude = 34.781769      # Geographic longitude (-180 to 180)
//!
//! #[Dimming]
//! brightness_high = 100      # Brightness at sunset (0-100)
//! brightness_low = 1         # Brightness reached by sleep time (0-100)
//! sleep_time = "22:00:00"    # Time by which lights reach brightness_low
//! reset_time = "07:00:00"    # Time at which the next day is planned
//!
//! #[Bulbs]
//! # lights = ["192.168.1.20"] # Bulb addresses; omit to discover them
//! command_timeout_ms = 1500  # Per-command network timeout (100-10000)
//! discovery_timeout_ms = 2000 # Discovery listen window (100-30000)
//!
//! #[Daemon]
//! poll_interval_ms = 1000    # Trigger polling interval (100-60000)
//! planning_retry_secs = 300  # Delay before re-planning after a failure (10-86400)
//! # log_file = "/path/to/sundim.log"
//! ```
//!
//! Loading validates every value; `brightness_high <= brightness_low` is
//! rejected before anything is scheduled. The file is watched for changes and
//! reloaded on `SIGUSR2`.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;


use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::bulb::yeelight::YeelightBulb;
use crate::constants::*;
use crate::core::{BrightnessRange, ScheduleSettings};
use crate::geo::Coordinate;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Contents of `sundim.toml`. `latitude` and `longitude` are required; other
/// missing keys take their defaults in [`loading::apply_defaults`].
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub brightness_high: Option<u32>,
    pub brightness_low: Option<u32>,
    pub sleep_time: Option<String>, // "HH:MM:SS"
    pub reset_time: Option<String>, // "HH:MM:SS"
    /// Bulb addresses as "host" or "host:port". Absent or empty means discovery.
    pub lights: Option<Vec<String>>,
    pub command_timeout_ms: Option<u64>,
    pub discovery_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub planning_retry_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// The scheduling part of the configuration.
    pub fn schedule_settings(&self) -> Result<ScheduleSettings> {
        let latitude = self.latitude.context("latitude is not set")?;
        let longitude = self.longitude.context("longitude is not set")?;

        let high = self.brightness_high.unwrap_or(u32::from(DEFAULT_BRIGHTNESS_HIGH));
        let low = self.brightness_low.unwrap_or(u32::from(DEFAULT_BRIGHTNESS_LOW));
        let high = u8::try_from(high).context("brightness_high out of range")?;
        let low = u8::try_from(low).context("brightness_low out of range")?;
        let range = BrightnessRange::new(high, low)?;

        Ok(ScheduleSettings::new(
            Coordinate::new(latitude, longitude),
            range,
            parse_time(self.sleep_time.as_deref().unwrap_or(DEFAULT_SLEEP_TIME), "sleep_time")?,
            parse_time(self.reset_time.as_deref().unwrap_or(DEFAULT_RESET_TIME), "reset_time")?,
            Duration::from_secs(
                self.planning_retry_secs
                    .unwrap_or(DEFAULT_PLANNING_RETRY_SECS),
            ),
        ))
    }

    /// Configured bulb addresses, resolved. Empty when discovery should be used.
    pub fn light_addresses(&self) -> Result<Vec<SocketAddr>> {
        self.lights
            .iter()
            .flatten()
            .map(|entry| YeelightBulb::resolve(entry))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(
            self.command_timeout_ms
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS),
        )
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(
            self.discovery_timeout_ms
                .unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_MS),
        )
    }

    /// Where the daemon appends its log.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .map(|dir| dir.join("sundim").join(LOG_FILE_NAME))
        })
    }

    /// Print the effective configuration.
    pub fn log_config(&self, path: &std::path::Path) {
        log_block_start!("Loaded configuration");
        log_indented!("Source: {}", path.display());

        match self.schedule_settings() {
            Ok(settings) => {
                log_indented!("Location: {}", settings.coordinate);
                log_indented!(
                    "Brightness: {}% at sunset → {}% by {}",
                    settings.range.high(),
                    settings.range.low(),
                    settings.sleep_time.format("%H:%M:%S")
                );
                log_indented!("Daily reset: {}", settings.reset_time.format("%H:%M:%S"));
            }
            Err(e) => log_warning!("Configuration is not usable: {e}"),
        }

        match self.lights.as_deref() {
            Some(lights) if !lights.is_empty() => log_indented!("Lights: {}", lights.join(", ")),
            _ => log_indented!("Lights: discovered on the local network"),
        }
        log_indented!(
            "Timeouts: command {}ms, discovery {}ms",
            self.command_timeout().as_millis(),
            self.discovery_timeout().as_millis()
        );
        log_indented!("Poll interval: {}ms", self.poll_interval().as_millis());
    }
}

pub(crate) fn parse_time(value: &str, key: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .with_context(|| format!("Invalid {key} '{value}'. Use HH:MM:SS format"))
}
