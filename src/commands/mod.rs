//! Command-line command handlers for sundim.
//!
//! One-shot commands load the configuration, do one thing and exit. They never
//! take the instance lock, so they work alongside a running daemon.

pub mod bulbs;
pub mod help;
pub mod plan;

use anyhow::Result;
use std::sync::Arc;

use crate::args::Command;
use crate::bulb::{self, BulbGroup};
use crate::config::Config;
use crate::time_source::{RealTimeSource, TimeSource};

/// Run a parsed one-shot command.
pub fn run_command(command: Command) -> Result<()> {
    let config = Config::load()?;
    let clock: Arc<dyn TimeSource> = Arc::new(RealTimeSource);

    match command {
        Command::Plan { date } => plan::run_plan_command(&config, clock, date),
        Command::Sun { date } => plan::run_sun_command(&config, clock, date),
        Command::On => bulbs::run_power_command(&mut open_group(&config, clock)?, bulbs::Power::On),
        Command::Off => {
            bulbs::run_power_command(&mut open_group(&config, clock)?, bulbs::Power::Off)
        }
        Command::Toggle => {
            bulbs::run_power_command(&mut open_group(&config, clock)?, bulbs::Power::Toggle)
        }
        Command::Brightness(percent) => {
            bulbs::run_brightness_command(&mut open_group(&config, clock)?, percent)
        }
        Command::Brighter(amount) => {
            bulbs::run_shift_command(&mut open_group(&config, clock)?, amount)
        }
        Command::Dimmer(amount) => {
            bulbs::run_shift_command(&mut open_group(&config, clock)?, amount.saturating_neg())
        }
        Command::Props { name } => {
            bulbs::run_props_command(&mut open_group(&config, clock)?, name.as_deref())
        }
    }
}

fn open_group(config: &Config, clock: Arc<dyn TimeSource>) -> Result<BulbGroup> {
    log_version!();
    bulb::open_group(
        &config.light_addresses()?,
        config.command_timeout(),
        config.discovery_timeout(),
        clock,
    )
}
