//! `plan` and `sun`: inspect the schedule without touching any light.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::Config;
use crate::core::DimPlan;
use crate::geo::SolarClock;
use crate::time_source::TimeSource;

/// Compute and print the plan `daily_reset` would build for `date`.
pub fn run_plan_command(
    config: &Config,
    clock: Arc<dyn TimeSource>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let settings = config.schedule_settings()?;
    let date = date.unwrap_or_else(|| clock.now().date_naive());
    let solar = SolarClock::new(settings.coordinate, clock);

    log_version!();
    log_block_start!("Dimming plan for {} at {}", date, settings.coordinate);

    let sunset = solar.sunset_at(Some(date))?;
    let plan = DimPlan::compute(sunset, settings.sleep_time, settings.range);
    log_plan(&plan);
    log_end!();
    Ok(())
}

/// Print sunrise and sunset for `date`.
pub fn run_sun_command(
    config: &Config,
    clock: Arc<dyn TimeSource>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let settings = config.schedule_settings()?;
    let date = date.unwrap_or_else(|| clock.now().date_naive());
    let solar = SolarClock::new(settings.coordinate, clock);

    log_version!();
    log_block_start!("Sun times for {} at {}", date, settings.coordinate);
    let sunrise = solar.sunrise_at(Some(date))?;
    let sunset = solar.sunset_at(Some(date))?;
    log_indented!("Sunrise: {}", sunrise.format("%H:%M:%S %Z"));
    log_indented!("Sunset:  {}", sunset.format("%H:%M:%S %Z"));
    log_indented!(
        "Daylight: {}",
        crate::time_source::format_duration(sunset - sunrise)
    );
    log_end!();
    Ok(())
}

fn log_plan(plan: &DimPlan) {
    log_decorated!("Sunset: {}", plan.sunset().format("%H:%M:%S"));
    log_decorated!("Sleep time: {}", plan.sleep_at().format("%H:%M:%S"));

    if plan.is_degenerate() {
        log_warning!("Sunset is not before sleep time, lights only turn on");
    } else {
        log_decorated!(
            "{} steps, one every {}s",
            plan.steps().len(),
            plan.seconds_per_chunk()
        );
    }

    log_indented!(
        "{}  on, {}%",
        plan.anchor().fire_at.format("%H:%M:%S"),
        plan.anchor().brightness
    );
    for step in plan.steps() {
        log_indented!("{}  {}%", step.fire_at.format("%H:%M:%S"), step.brightness);
    }
}
