//! One-shot bulb commands: power, brightness and property snapshots.

use anyhow::Result;

use crate::bulb::{BulbGroup, GroupReport};

/// Power action for [`run_power_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
    Toggle,
}

pub fn run_power_command(group: &mut BulbGroup, power: Power) -> Result<()> {
    ensure_lights(group)?;
    let report = match power {
        Power::On => group.turn_on(),
        Power::Off => group.turn_off(),
        Power::Toggle => group.toggle(),
    };
    finish(&report)
}

pub fn run_brightness_command(group: &mut BulbGroup, percent: u8) -> Result<()> {
    ensure_lights(group)?;
    let report = group.set_brightness(percent);
    finish(&report)
}

/// Positive `amount` brightens, negative dims.
pub fn run_shift_command(group: &mut BulbGroup, amount: i16) -> Result<()> {
    ensure_lights(group)?;
    let report = if amount >= 0 {
        group.increase_brightness(amount)
    } else {
        group.decrease_brightness(amount.saturating_neg())
    };
    finish(&report)
}

pub fn run_props_command(group: &mut BulbGroup, name: Option<&str>) -> Result<()> {
    ensure_lights(group)?;

    match name {
        Some(name) => {
            log_block_start!("Property '{}':", name);
            for (address, value) in group.snapshot_property(name) {
                match value {
                    Some(value) => log_indented!("{}: {}", address, value),
                    None => log_indented!("{}: (no value)", address),
                }
            }
        }
        None => {
            for reading in group.snapshot_properties() {
                log_block_start!(
                    "{} at {}",
                    reading.address,
                    reading.captured_at.format("%H:%M:%S")
                );
                match &reading.values {
                    Ok(values) => {
                        for (key, value) in values {
                            log_indented!("{key} = {value}");
                        }
                    }
                    Err(e) => log_indented!("unavailable: {}", e.message),
                }
            }
        }
    }

    log_end!();
    Ok(())
}

fn ensure_lights(group: &BulbGroup) -> Result<()> {
    if group.is_empty() {
        log_end!();
        anyhow::bail!("No bulbs configured or discovered");
    }
    Ok(())
}

/// Summarise a group command; any failed light makes the command fail.
fn finish(report: &GroupReport) -> Result<()> {
    log_block_start!(
        "{} of {} lights succeeded",
        report.succeeded(),
        report.outcomes().len()
    );
    log_end!();

    if report.failed() > 0 {
        anyhow::bail!("{} light(s) failed", report.failed());
    }
    Ok(())
}
