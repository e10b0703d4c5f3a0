//! Default configuration file generation.
//!
//! Writes a commented `sundim.toml` with aligned `# comment` columns, built
//! with a small section/setting builder.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Create the default config file at `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))?;

    log_block_start!("Created default configuration: {}", path.display());
    log_indented!("Edit latitude and longitude to match your location");
    Ok(())
}

/// Text of a freshly generated configuration file.
pub fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "latitude",
            &format!("{DEFAULT_LATITUDE:.6}"),
            "Geographic latitude (-90 to 90)",
        )
        .add_setting(
            "longitude",
            &format!("{DEFAULT_LONGITUDE:.6}"),
            "Geographic longitude (-180 to 180)",
        )
        .add_section("Dimming")
        .add_setting(
            "brightness_high",
            &DEFAULT_BRIGHTNESS_HIGH.to_string(),
            &format!("Brightness at sunset ({MINIMUM_BRIGHTNESS}-{MAXIMUM_BRIGHTNESS})"),
        )
        .add_setting(
            "brightness_low",
            &DEFAULT_BRIGHTNESS_LOW.to_string(),
            &format!(
                "Brightness reached by sleep time ({MINIMUM_BRIGHTNESS}-{MAXIMUM_BRIGHTNESS})"
            ),
        )
        .add_setting(
            "sleep_time",
            &format!("\"{DEFAULT_SLEEP_TIME}\""),
            "Time by which lights reach brightness_low (HH:MM:SS)",
        )
        .add_setting(
            "reset_time",
            &format!("\"{DEFAULT_RESET_TIME}\""),
            "Time at which the next day is planned (HH:MM:SS)",
        )
        .add_section("Bulbs")
        .add_commented_setting(
            "lights",
            "[\"192.168.1.20\", \"192.168.1.21:55443\"]",
            "Bulb addresses; leave unset to discover bulbs",
        )
        .add_setting(
            "command_timeout_ms",
            &DEFAULT_COMMAND_TIMEOUT_MS.to_string(),
            &format!(
                "Network timeout per bulb command ({MINIMUM_COMMAND_TIMEOUT_MS}-{MAXIMUM_COMMAND_TIMEOUT_MS})ms"
            ),
        )
        .add_setting(
            "discovery_timeout_ms",
            &DEFAULT_DISCOVERY_TIMEOUT_MS.to_string(),
            &format!(
                "How long to listen for discovery replies ({MINIMUM_DISCOVERY_TIMEOUT_MS}-{MAXIMUM_DISCOVERY_TIMEOUT_MS})ms"
            ),
        )
        .add_section("Daemon")
        .add_setting(
            "poll_interval_ms",
            &DEFAULT_POLL_INTERVAL_MS.to_string(),
            &format!(
                "Trigger polling interval ({MINIMUM_POLL_INTERVAL_MS}-{MAXIMUM_POLL_INTERVAL_MS})ms"
            ),
        )
        .add_setting(
            "planning_retry_secs",
            &DEFAULT_PLANNING_RETRY_SECS.to_string(),
            &format!(
                "Re-plan delay after a failed reset ({MINIMUM_PLANNING_RETRY_SECS}-{MAXIMUM_PLANNING_RETRY_SECS})s"
            ),
        )
        .add_commented_setting(
            "log_file",
            "\"/path/to/sundim.log\"",
            "Log file; defaults to the XDG state directory",
        )
        .build()
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting written commented out, for optional keys.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // Align every comment one space past the longest setting line
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut text = result.join("\n");
        text.push('\n');
        text
    }
}
