//! Configuration validation functionality.
//!
//! Rejects values the scheduler cannot work with before anything is planned.

use anyhow::Result;

use super::{Config, parse_time};
use crate::constants::*;
use crate::core::ScheduleError;

/// Validate every key present in `config`. Absent keys are not checked; their
/// defaults are valid by construction. The coordinate has no default: a wrong
/// location silently shifts every sunset.
pub fn validate_config(config: &Config) -> Result<()> {
    let Some(lat) = config.latitude else {
        anyhow::bail!("latitude is required (decimal degrees, -90 to 90)");
    };
    let Some(lon) = config.longitude else {
        anyhow::bail!("longitude is required (decimal degrees, -180 to 180)");
    };

    if !(-90.0..=90.0).contains(&lat) {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    let brightness_limits = u32::from(MINIMUM_BRIGHTNESS)..=u32::from(MAXIMUM_BRIGHTNESS);
    for (key, value) in [
        ("brightness_high", config.brightness_high),
        ("brightness_low", config.brightness_low),
    ] {
        if let Some(value) = value
            && !brightness_limits.contains(&value)
        {
            anyhow::bail!(
                "{key} ({value}) must be between {MINIMUM_BRIGHTNESS} and {MAXIMUM_BRIGHTNESS}"
            );
        }
    }

    let high = config
        .brightness_high
        .unwrap_or(u32::from(DEFAULT_BRIGHTNESS_HIGH));
    let low = config
        .brightness_low
        .unwrap_or(u32::from(DEFAULT_BRIGHTNESS_LOW));
    if high <= low {
        // Both fit in u8 after the range check above
        return Err(ScheduleError::InvalidRange {
            high: high as u8,
            low: low as u8,
        }
        .into());
    }

    if let Some(ref sleep_time) = config.sleep_time {
        parse_time(sleep_time, "sleep_time")?;
    }
    if let Some(ref reset_time) = config.reset_time {
        parse_time(reset_time, "reset_time")?;
    }

    validate_range(
        "command_timeout_ms",
        config.command_timeout_ms,
        MINIMUM_COMMAND_TIMEOUT_MS,
        MAXIMUM_COMMAND_TIMEOUT_MS,
    )?;
    validate_range(
        "discovery_timeout_ms",
        config.discovery_timeout_ms,
        MINIMUM_DISCOVERY_TIMEOUT_MS,
        MAXIMUM_DISCOVERY_TIMEOUT_MS,
    )?;
    validate_range(
        "poll_interval_ms",
        config.poll_interval_ms,
        MINIMUM_POLL_INTERVAL_MS,
        MAXIMUM_POLL_INTERVAL_MS,
    )?;
    validate_range(
        "planning_retry_secs",
        config.planning_retry_secs,
        MINIMUM_PLANNING_RETRY_SECS,
        MAXIMUM_PLANNING_RETRY_SECS,
    )?;

    for light in config.lights.iter().flatten() {
        if light.trim().is_empty() {
            anyhow::bail!("lights must not contain empty addresses");
        }
        // Literal IPs are checked here; host names resolve when the group opens
        if light.parse::<std::net::IpAddr>().is_err()
            && light.parse::<std::net::SocketAddr>().is_err()
            && !looks_like_host(light)
        {
            anyhow::bail!("Invalid light address '{light}'. Use host or host:port");
        }
    }

    Ok(())
}

fn validate_range(key: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    if let Some(value) = value
        && !(min..=max).contains(&value)
    {
        anyhow::bail!("{key} ({value}) must be between {min} and {max}");
    }
    Ok(())
}

/// `name` or `name:port` with a plausible host name.
fn looks_like_host(entry: &str) -> bool {
    let (host, port) = match entry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (entry, None),
    };

    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    let port_ok = port.is_none_or(|p| p.parse::<u16>().is_ok());

    host_ok && port_ok
}
