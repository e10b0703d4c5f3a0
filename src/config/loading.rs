//! Configuration loading functionality.
//!
//! Handles locating the configuration file, creating a default one on first
//! start, parsing, validation and defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::constants::*;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
/// Returns an error if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
/// Returns None if using the default directory.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `sundim.toml`: inside the custom directory if one was set, otherwise
/// under the XDG config directory.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("sundim").join(CONFIG_FILE_NAME))
}

/// Load configuration using automatic path detection.
///
/// This function will create a default configuration file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Load configuration from a specific path.
///
/// This version does NOT create a default config if the path doesn't exist.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

/// Fill in every optional key the file left out.
pub(crate) fn apply_defaults(config: &mut Config) {
    if config.brightness_high.is_none() {
        config.brightness_high = Some(u32::from(DEFAULT_BRIGHTNESS_HIGH));
    }
    if config.brightness_low.is_none() {
        config.brightness_low = Some(u32::from(DEFAULT_BRIGHTNESS_LOW));
    }

    if config.sleep_time.is_none() {
        config.sleep_time = Some(DEFAULT_SLEEP_TIME.to_string());
    }
    if config.reset_time.is_none() {
        config.reset_time = Some(DEFAULT_RESET_TIME.to_string());
    }

    if config.command_timeout_ms.is_none() {
        config.command_timeout_ms = Some(DEFAULT_COMMAND_TIMEOUT_MS);
    }
    if config.discovery_timeout_ms.is_none() {
        config.discovery_timeout_ms = Some(DEFAULT_DISCOVERY_TIMEOUT_MS);
    }
    if config.poll_interval_ms.is_none() {
        config.poll_interval_ms = Some(DEFAULT_POLL_INTERVAL_MS);
    }
    if config.planning_retry_secs.is_none() {
        config.planning_retry_secs = Some(DEFAULT_PLANNING_RETRY_SECS);
    }
}
