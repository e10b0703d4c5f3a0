//! Application-wide defaults, limits and protocol constants.

use std::time::Duration;

// # Schedule defaults

// Only written into a freshly generated config file; loading never falls back to them
pub const DEFAULT_LATITUDE: f64 = 32.0853;
pub const DEFAULT_LONGITUDE: f64 = 34.781769;
pub const DEFAULT_BRIGHTNESS_HIGH: u8 = 100;
pub const DEFAULT_BRIGHTNESS_LOW: u8 = 1;
pub const DEFAULT_SLEEP_TIME: &str = "22:00:00";
/// Runs well after the lights reach low brightness and before the next sunset.
pub const DEFAULT_RESET_TIME: &str = "07:00:00";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PLANNING_RETRY_SECS: u64 = 300;

// # Validation limits

pub const MINIMUM_BRIGHTNESS: u8 = 0;
pub const MAXIMUM_BRIGHTNESS: u8 = 100;

pub const MINIMUM_POLL_INTERVAL_MS: u64 = 100;
pub const MAXIMUM_POLL_INTERVAL_MS: u64 = 60_000;
pub const MINIMUM_COMMAND_TIMEOUT_MS: u64 = 100;
pub const MAXIMUM_COMMAND_TIMEOUT_MS: u64 = 10_000;
pub const MINIMUM_DISCOVERY_TIMEOUT_MS: u64 = 100;
pub const MAXIMUM_DISCOVERY_TIMEOUT_MS: u64 = 30_000;
pub const MINIMUM_PLANNING_RETRY_SECS: u64 = 10;
pub const MAXIMUM_PLANNING_RETRY_SECS: u64 = 86_400;

// # Bulbs

/// Entries kept in the property snapshot history before the oldest is evicted.
pub const PROPERTY_HISTORY_CAPACITY: usize = 100;
pub const YEELIGHT_PORT: u16 = 55443;
pub const DISCOVERY_MULTICAST_ADDR: &str = "239.255.255.250:1982";
/// Fade applied by the bulb itself when changing power or brightness.
pub const BULB_TRANSITION_MS: u64 = 500;
/// Unsolicited notification lines tolerated before a reply is considered lost.
pub const MAX_NOTIFICATION_LINES: usize = 8;
/// Default step for `brighter` / `dimmer`.
pub const DEFAULT_BRIGHTNESS_STEP: i16 = 10;

/// Properties requested for a full snapshot.
pub const SNAPSHOT_PROPERTIES: &[&str] = &[
    "power",
    "bright",
    "ct",
    "rgb",
    "hue",
    "sat",
    "color_mode",
    "flowing",
    "delayoff",
    "music_on",
    "name",
];

// # Process

pub const CONFIG_FILE_NAME: &str = "sundim.toml";
pub const LOG_FILE_NAME: &str = "sundim.log";
pub const LOCK_FILE_NAME: &str = "sundim.lock";
/// Debounce for config file change events; editors write in several steps.
pub const CONFIG_WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub const EXIT_FAILURE: i32 = 1;
