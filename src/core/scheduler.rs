//! Daily re-planning and trigger execution.
//!
//! [`DailyScheduler`] owns the trigger table, the bulb group and the schedule
//! settings. `daily_reset` computes today's sunset, derives the [`DimPlan`] and
//! swaps in a freshly built table; `tick` fires whatever is due. Failures from
//! bulbs are logged per light inside [`BulbGroup`] and never escape `tick`.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveTime};
use std::sync::Arc;
use std::time::Duration;

use super::plan::{BrightnessRange, DimPlan};
use super::triggers::{TriggerAction, TriggerTable};
use crate::bulb::BulbGroup;
use crate::geo::{Coordinate, SolarClock};
use crate::time_source::TimeSource;

/// Everything `daily_reset` needs to build a day's plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    pub coordinate: Coordinate,
    pub range: BrightnessRange,
    pub sleep_time: NaiveTime,
    /// Time-of-day at which the next day's plan is built.
    pub reset_time: NaiveTime,
    /// Delay before re-planning after a failed reset.
    pub planning_retry: Duration,
}

pub struct DailyScheduler {
    settings: ScheduleSettings,
    pending: Option<ScheduleSettings>,
    bulbs: BulbGroup,
    clock: Arc<dyn TimeSource>,
    triggers: TriggerTable,
    plan: Option<DimPlan>,
    retry_at: Option<DateTime<Local>>,
}

impl DailyScheduler {
    /// A scheduler with no triggers. Call [`daily_reset`](Self::daily_reset) to plan.
    pub fn new(settings: ScheduleSettings, bulbs: BulbGroup, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            settings,
            pending: None,
            bulbs,
            clock,
            triggers: TriggerTable::new(),
            plan: None,
            retry_at: None,
        }
    }

    /// Discard all triggers and plan today from scratch.
    ///
    /// On a `ScheduleError::Geolocation` the current table stays in place and a
    /// retry is scheduled `planning_retry` from now.
    pub fn daily_reset(&mut self) -> Result<()> {
        if let Some(settings) = self.pending.take() {
            log_block_start!("Applying updated configuration");
            self.settings = settings;
        }

        let now = self.clock.now();
        log_block_start!("Daily reset at {}", now.format("%Y-%m-%d %H:%M:%S"));

        let solar = SolarClock::new(self.settings.coordinate, self.clock.clone());
        let sunset = match solar.sunset_at(Some(now.date_naive())) {
            Ok(sunset) => sunset,
            Err(e) => {
                let retry_in = chrono::Duration::from_std(self.settings.planning_retry)
                    .unwrap_or_else(|_| chrono::Duration::minutes(5));
                let retry_at = now + retry_in;
                log_error!("Planning failed: {e}");
                log_indented!(
                    "Keeping {} existing triggers, retrying at {}",
                    self.triggers.len(),
                    retry_at.format("%Y-%m-%d %H:%M:%S")
                );
                self.retry_at = Some(retry_at);
                return Err(e.into());
            }
        };
        self.retry_at = None;

        let plan = DimPlan::compute(sunset, self.settings.sleep_time, self.settings.range);
        let table = self.build_table(&plan, now);

        log_decorated!("Location: {}", self.settings.coordinate);
        log_decorated!("Sunset: {}", sunset.format("%H:%M:%S"));
        log_decorated!("Sleep time: {}", plan.sleep_at().format("%H:%M:%S"));
        if plan.is_degenerate() {
            log_warning!("Sunset is not before sleep time, no dimming today");
        } else {
            log_decorated!(
                "Dimming {}% → {}% in {} steps of {}s",
                self.settings.range.high(),
                self.settings.range.low(),
                plan.steps().len(),
                plan.seconds_per_chunk()
            );
        }
        log_indented!(
            "{} → on at {}%",
            plan.anchor().fire_at.format("%H:%M:%S"),
            plan.anchor().brightness
        );
        for step in plan.steps() {
            log_indented!("{} → {}%", step.fire_at.format("%H:%M:%S"), step.brightness);
        }
        log_decorated!("Next reset: {}", self.settings.reset_time.format("%H:%M:%S"));

        self.triggers = table;
        self.plan = Some(plan);
        Ok(())
    }

    /// Fire every trigger that is due, then return.
    ///
    /// A `DailyReset` swaps the table, so anything else due from the old table
    /// is dropped.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if let Some(retry_at) = self.retry_at
            && now >= retry_at
        {
            log_info!("Retrying daily planning");
            // A fresh table has nothing due yet; after a failure the kept table still fires
            if self.daily_reset().is_ok() {
                return;
            }
        }

        while let Some(action) = self.triggers.pop_due(now) {
            match action {
                TriggerAction::DailyReset => {
                    let _ = self.daily_reset();
                    break;
                }
                TriggerAction::TurnOn { brightness } => {
                    log_block_start!("Sunset: turning lights on at {}%", brightness);
                    self.bulbs.turn_on();
                    self.bulbs.set_brightness(brightness);
                }
                TriggerAction::SetBrightness(brightness) => {
                    log_block_start!("Dimming step: {}%", brightness);
                    self.bulbs.set_brightness(brightness);
                }
            }
        }
    }

    /// Queue new settings; they take effect at the next `daily_reset`.
    pub fn reconfigure(&mut self, settings: ScheduleSettings) {
        if settings == self.settings {
            log_decorated!("Configuration unchanged");
            self.pending = None;
            return;
        }
        log_decorated!(
            "New configuration accepted, applies at the next reset ({})",
            self.settings.reset_time.format("%H:%M:%S")
        );
        self.pending = Some(settings);
    }

    /// Today's plan, once a reset has succeeded.
    pub fn plan(&self) -> Option<&DimPlan> {
        self.plan.as_ref()
    }

    pub fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    pub fn pending_settings(&self) -> Option<&ScheduleSettings> {
        self.pending.as_ref()
    }

    /// When the next planning retry is due after a failed reset.
    pub fn retry_at(&self) -> Option<DateTime<Local>> {
        self.retry_at
    }

    pub fn bulbs(&self) -> &BulbGroup {
        &self.bulbs
    }

    fn build_table(&self, plan: &DimPlan, now: DateTime<Local>) -> TriggerTable {
        let mut table = TriggerTable::new();
        table.register(self.settings.reset_time, TriggerAction::DailyReset, now);

        let anchor = plan.anchor();
        table.register(
            anchor.fire_at.time(),
            TriggerAction::TurnOn {
                brightness: anchor.brightness,
            },
            now,
        );
        for step in plan.steps() {
            table.register(
                step.fire_at.time(),
                TriggerAction::SetBrightness(step.brightness),
                now,
            );
        }
        table
    }
}

/// Convenience for settings built in code rather than from a file.
impl ScheduleSettings {
    pub fn new(
        coordinate: Coordinate,
        range: BrightnessRange,
        sleep_time: NaiveTime,
        reset_time: NaiveTime,
        planning_retry: Duration,
    ) -> Self {
        Self {
            coordinate,
            range,
            sleep_time,
            reset_time,
            planning_retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulb::{BulbCommandError, Light, MockLight};
    use crate::constants::test_constants::*;
    use crate::time_source::{ManualTimeSource, parse_datetime};
    use mockall::predicate::eq;

    fn settings(latitude: f64, longitude: f64) -> ScheduleSettings {
        ScheduleSettings::new(
            Coordinate::new(latitude, longitude),
            BrightnessRange::new(100, 1).unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            Duration::from_secs(300),
        )
    }

    fn scheduler_at(
        start: &str,
        settings: ScheduleSettings,
        lights: Vec<Box<dyn Light>>,
    ) -> (DailyScheduler, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(parse_datetime(start).unwrap()));
        let bulbs = BulbGroup::new(lights, clock.clone());
        (DailyScheduler::new(settings, bulbs, clock.clone()), clock)
    }

    #[test]
    fn test_reset_registers_reset_anchor_and_steps() {
        let (mut scheduler, _) = scheduler_at(
            "2024-01-15 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            Vec::new(),
        );

        scheduler.daily_reset().unwrap();

        let plan = scheduler.plan().unwrap();
        assert_eq!(plan.steps().len(), 99);
        // reset + anchor + 99 steps
        assert_eq!(scheduler.triggers().len(), 101);
        assert_eq!(
            scheduler
                .triggers()
                .iter()
                .filter(|t| t.action() == TriggerAction::DailyReset)
                .count(),
            1
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut scheduler, _) = scheduler_at(
            "2024-01-15 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            Vec::new(),
        );

        scheduler.daily_reset().unwrap();
        let first_plan = scheduler.plan().cloned();
        let first_table = scheduler.triggers().clone();

        scheduler.daily_reset().unwrap();

        assert_eq!(scheduler.plan().cloned(), first_plan);
        assert_eq!(scheduler.triggers(), &first_table);
    }

    #[test]
    fn test_geolocation_failure_keeps_table_and_schedules_retry() {
        let (mut scheduler, clock) = scheduler_at(
            "2024-12-20 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            Vec::new(),
        );
        scheduler.daily_reset().unwrap();
        let table = scheduler.triggers().clone();

        scheduler.reconfigure(settings(LONGYEARBYEN_LATITUDE, LONGYEARBYEN_LONGITUDE));
        let err = scheduler.daily_reset().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::core::ScheduleError>(),
            Some(crate::core::ScheduleError::Geolocation { .. })
        ));
        assert_eq!(scheduler.triggers(), &table);
        assert_eq!(
            scheduler.retry_at(),
            Some(clock.now() + chrono::Duration::seconds(300))
        );
    }

    #[test]
    fn test_tick_retries_planning_until_it_succeeds() {
        let (mut scheduler, clock) = scheduler_at(
            "2024-12-20 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            Vec::new(),
        );
        scheduler.daily_reset().unwrap();
        scheduler.reconfigure(settings(LONGYEARBYEN_LATITUDE, LONGYEARBYEN_LONGITUDE));
        assert!(scheduler.daily_reset().is_err());
        let first_retry = scheduler.retry_at().unwrap();

        // Not due yet: nothing changes
        clock.set(first_retry - chrono::Duration::seconds(1));
        scheduler.tick();
        assert_eq!(scheduler.retry_at(), Some(first_retry));

        // Still polar night: the retry fails and is pushed forward
        clock.set(first_retry + chrono::Duration::seconds(1));
        scheduler.tick();
        let second_retry = scheduler.retry_at().unwrap();
        assert_eq!(second_retry, clock.now() + chrono::Duration::seconds(300));

        // A workable coordinate lets the next retry plan the day
        scheduler.reconfigure(settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE));
        clock.set(second_retry);
        scheduler.tick();
        assert_eq!(scheduler.retry_at(), None);
        assert_eq!(
            scheduler.settings().coordinate,
            Coordinate::new(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE)
        );
        let plan = scheduler.plan().unwrap();
        assert_eq!(plan.sunset().date_naive(), clock.now().date_naive());
        assert_eq!(scheduler.triggers().len(), 101);
    }

    #[test]
    fn test_failed_retry_still_fires_due_triggers() {
        let mut light = MockLight::new();
        light.expect_address().return_const("10.0.0.2:55443".to_string());
        light.expect_set_power().with(eq(true)).times(1).returning(|_| Ok(()));
        light.expect_set_brightness().with(eq(100)).times(1).returning(|_| Ok(()));

        let (mut scheduler, clock) = scheduler_at(
            "2024-12-20 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            vec![Box::new(light)],
        );
        scheduler.daily_reset().unwrap();
        let plan = scheduler.plan().unwrap().clone();

        // Fail planning 250s before sunset, so the retry lands 50s after it
        scheduler.reconfigure(settings(LONGYEARBYEN_LATITUDE, LONGYEARBYEN_LONGITUDE));
        clock.set(plan.anchor().fire_at - chrono::Duration::seconds(250));
        assert!(scheduler.daily_reset().is_err());

        clock.set(plan.anchor().fire_at + chrono::Duration::seconds(60));
        assert!(plan.steps()[0].fire_at > clock.now());
        scheduler.tick();

        assert!(scheduler.retry_at().unwrap() > clock.now());
    }

    #[test]
    fn test_reconfigure_waits_for_next_reset() {
        let (mut scheduler, _) = scheduler_at(
            "2024-01-15 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            Vec::new(),
        );
        scheduler.daily_reset().unwrap();

        let mut updated = settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE);
        updated.range = BrightnessRange::new(50, 40).unwrap();
        scheduler.reconfigure(updated.clone());

        assert_eq!(scheduler.plan().unwrap().steps().len(), 99);
        assert!(scheduler.pending_settings().is_some());

        scheduler.daily_reset().unwrap();
        assert_eq!(scheduler.plan().unwrap().steps().len(), 10);
        assert_eq!(scheduler.settings(), &updated);
        assert!(scheduler.pending_settings().is_none());
    }

    #[test]
    fn test_tick_fires_anchor_then_steps() {
        let mut light = MockLight::new();
        light.expect_address().return_const("10.0.0.2:55443".to_string());
        light.expect_set_power().with(eq(true)).times(1).returning(|_| Ok(()));
        light.expect_set_brightness().with(eq(100)).times(1).returning(|_| Ok(()));
        light.expect_set_brightness().with(eq(99)).times(1).returning(|_| Ok(()));

        let (mut scheduler, clock) = scheduler_at(
            "2024-01-15 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            vec![Box::new(light)],
        );
        scheduler.daily_reset().unwrap();

        let plan = scheduler.plan().unwrap().clone();
        clock.set(plan.anchor().fire_at);
        scheduler.tick();

        clock.set(plan.steps()[0].fire_at);
        scheduler.tick();
    }

    #[test]
    fn test_failing_light_does_not_stop_the_schedule() {
        let mut light = MockLight::new();
        light.expect_address().return_const("10.0.0.9:55443".to_string());
        light
            .expect_set_power()
            .returning(|_| Err(BulbCommandError::new("10.0.0.9:55443", "timed out")));
        light
            .expect_set_brightness()
            .times(2)
            .returning(|_| Err(BulbCommandError::new("10.0.0.9:55443", "timed out")));

        let (mut scheduler, clock) = scheduler_at(
            "2024-01-15 07:00:00",
            settings(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
            vec![Box::new(light)],
        );
        scheduler.daily_reset().unwrap();
        let plan = scheduler.plan().unwrap().clone();
        let before = scheduler.triggers().len();

        clock.set(plan.anchor().fire_at);
        scheduler.tick();
        clock.set(plan.steps()[0].fire_at);
        scheduler.tick();

        assert_eq!(scheduler.triggers().len(), before);
    }
}
