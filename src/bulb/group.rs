//! Fan-out of one command to every light in the group.
//!
//! Commands are issued sequentially. A light that fails is logged with its
//! address and reported in the returned [`GroupReport`]; the remaining lights
//! still receive the command and nothing is propagated to the caller.

use chrono::{DateTime, Local};
use std::sync::Arc;

use super::{BulbCommandError, Light, PropertyHistory, PropertyMap};
use crate::constants::{MAXIMUM_BRIGHTNESS, PROPERTY_HISTORY_CAPACITY};
use crate::time_source::TimeSource;

/// Result of one command on one light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightOutcome {
    pub address: String,
    pub result: Result<(), BulbCommandError>,
}

/// Per-light outcomes of a group command, in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReport {
    outcomes: Vec<LightOutcome>,
}

impl GroupReport {
    pub fn outcomes(&self) -> &[LightOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Properties read from one light at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReading {
    pub address: String,
    pub captured_at: DateTime<Local>,
    pub values: Result<PropertyMap, BulbCommandError>,
}

impl PropertyReading {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.as_ref().ok()?.get(name).map(String::as_str)
    }
}

pub struct BulbGroup {
    lights: Vec<Box<dyn Light>>,
    history: PropertyHistory<Vec<PropertyReading>>,
    clock: Arc<dyn TimeSource>,
}

impl BulbGroup {
    pub fn new(lights: Vec<Box<dyn Light>>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            lights,
            history: PropertyHistory::with_capacity(PROPERTY_HISTORY_CAPACITY),
            clock,
        }
    }

    pub fn addresses(&self) -> Vec<String> {
        self.lights.iter().map(|light| light.address()).collect()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn turn_on(&mut self) -> GroupReport {
        log_decorated!("Turning bulbs on");
        self.for_each("power on", |light| light.set_power(true))
    }

    pub fn turn_off(&mut self) -> GroupReport {
        log_decorated!("Turning bulbs off");
        self.for_each("power off", |light| light.set_power(false))
    }

    pub fn toggle(&mut self) -> GroupReport {
        log_decorated!("Toggling bulbs");
        self.for_each("toggle", |light| light.toggle())
    }

    /// Set every light to `percent`, clamped to 100.
    pub fn set_brightness(&mut self, percent: u8) -> GroupReport {
        let percent = percent.min(MAXIMUM_BRIGHTNESS);
        log_decorated!("Setting brightness to {}%", percent);
        self.for_each("set brightness", |light| light.set_brightness(percent))
    }

    /// Raise each light's current brightness by `amount`, clamped to 1..=100.
    pub fn increase_brightness(&mut self, amount: i16) -> GroupReport {
        log_decorated!("Increasing brightness by {}", amount);
        self.for_each("increase brightness", |light| shift_brightness(light, amount))
    }

    /// Lower each light's current brightness by `amount`, clamped to 1..=100.
    pub fn decrease_brightness(&mut self, amount: i16) -> GroupReport {
        log_decorated!("Decreasing brightness by {}", amount);
        self.for_each("decrease brightness", |light| {
            shift_brightness(light, amount.saturating_neg())
        })
    }

    /// Read the standard properties of every light and append them to history.
    pub fn snapshot_properties(&mut self) -> Vec<PropertyReading> {
        let captured_at = self.clock.now();
        let readings: Vec<PropertyReading> = self
            .lights
            .iter_mut()
            .map(|light| {
                let address = light.address();
                let values = light.properties();
                if let Err(e) = &values {
                    log_error!("Reading properties from {} failed: {}", address, e.message);
                }
                PropertyReading {
                    address,
                    captured_at,
                    values,
                }
            })
            .collect();

        self.history.push(readings.clone());
        readings
    }

    /// One property from a fresh snapshot, per light. `None` where the light
    /// failed to answer or does not report `name`.
    pub fn snapshot_property(&mut self, name: &str) -> Vec<(String, Option<String>)> {
        self.snapshot_properties()
            .into_iter()
            .map(|reading| {
                let value = reading.get(name).map(str::to_string);
                (reading.address, value)
            })
            .collect()
    }

    pub fn history(&self) -> &PropertyHistory<Vec<PropertyReading>> {
        &self.history
    }

    fn for_each<F>(&mut self, what: &str, mut command: F) -> GroupReport
    where
        F: FnMut(&mut dyn Light) -> Result<(), BulbCommandError>,
    {
        let outcomes = self
            .lights
            .iter_mut()
            .map(|light| {
                let address = light.address();
                let result = command(light.as_mut());
                if let Err(e) = &result {
                    log_error!("{} failed on {}: {}", what, address, e.message);
                }
                LightOutcome { address, result }
            })
            .collect();

        GroupReport { outcomes }
    }
}

fn shift_brightness(light: &mut dyn Light, amount: i16) -> Result<(), BulbCommandError> {
    let properties = light.properties()?;
    let current: i16 = properties
        .get("bright")
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| BulbCommandError::new(light.address(), "bulb did not report brightness"))?;

    let target = current.saturating_add(amount).clamp(1, i16::from(MAXIMUM_BRIGHTNESS));
    light.set_brightness(target as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulb::MockLight;
    use crate::time_source::{ManualTimeSource, parse_datetime};
    use mockall::predicate::eq;

    fn clock() -> Arc<dyn TimeSource> {
        Arc::new(ManualTimeSource::new(
            parse_datetime("2024-01-15 18:00:00").unwrap(),
        ))
    }

    fn light_at(address: &str) -> MockLight {
        let mut light = MockLight::new();
        light.expect_address().return_const(address.to_string());
        light
    }

    fn failure(address: &str) -> BulbCommandError {
        BulbCommandError::new(address, "connection refused")
    }

    fn props(bright: &str) -> PropertyMap {
        PropertyMap::from([("bright".to_string(), bright.to_string())])
    }

    #[test]
    fn test_one_failing_light_does_not_stop_the_others() {
        let mut first = light_at("10.0.0.2:55443");
        first.expect_set_brightness().with(eq(50)).times(1).returning(|_| Ok(()));

        let mut second = light_at("10.0.0.3:55443");
        second
            .expect_set_brightness()
            .with(eq(50))
            .times(1)
            .returning(|_| Err(failure("10.0.0.3:55443")));

        let mut third = light_at("10.0.0.4:55443");
        third.expect_set_brightness().with(eq(50)).times(1).returning(|_| Ok(()));

        let mut group = BulbGroup::new(
            vec![Box::new(first), Box::new(second), Box::new(third)],
            clock(),
        );

        let report = group.set_brightness(50);

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes()[1].address, "10.0.0.3:55443");
        assert!(report.outcomes()[1].result.is_err());
    }

    #[test]
    fn test_power_commands_reach_every_light() {
        let mut lights: Vec<Box<dyn Light>> = Vec::new();
        for i in 0..3 {
            let mut light = light_at(&format!("10.0.0.{i}:55443"));
            light.expect_set_power().with(eq(true)).times(1).returning(|_| Ok(()));
            light.expect_set_power().with(eq(false)).times(1).returning(|_| Ok(()));
            light.expect_toggle().times(1).returning(|| Ok(()));
            lights.push(Box::new(light));
        }
        let mut group = BulbGroup::new(lights, clock());

        assert!(group.turn_on().all_succeeded());
        assert!(group.turn_off().all_succeeded());
        assert!(group.toggle().all_succeeded());
    }

    #[test]
    fn test_set_brightness_clamps_to_100() {
        let mut light = light_at("10.0.0.2:55443");
        light.expect_set_brightness().with(eq(100)).times(1).returning(|_| Ok(()));

        let mut group = BulbGroup::new(vec![Box::new(light)], clock());
        assert!(group.set_brightness(200).all_succeeded());
    }

    #[test]
    fn test_increase_brightness_clamps_at_top() {
        let mut light = light_at("10.0.0.2:55443");
        light.expect_properties().returning(|| Ok(props("95")));
        light.expect_set_brightness().with(eq(100)).times(1).returning(|_| Ok(()));

        let mut group = BulbGroup::new(vec![Box::new(light)], clock());
        assert!(group.increase_brightness(10).all_succeeded());
    }

    #[test]
    fn test_decrease_brightness_never_goes_below_one() {
        let mut light = light_at("10.0.0.2:55443");
        light.expect_properties().returning(|| Ok(props("5")));
        light.expect_set_brightness().with(eq(1)).times(1).returning(|_| Ok(()));

        let mut group = BulbGroup::new(vec![Box::new(light)], clock());
        assert!(group.decrease_brightness(10).all_succeeded());
    }

    #[test]
    fn test_shift_without_brightness_property_fails_that_light() {
        let mut light = light_at("10.0.0.2:55443");
        light.expect_properties().returning(|| Ok(PropertyMap::new()));
        light.expect_set_brightness().never();

        let mut group = BulbGroup::new(vec![Box::new(light)], clock());
        assert_eq!(group.increase_brightness(10).failed(), 1);
    }

    #[test]
    fn test_snapshots_are_recorded_with_capture_time() {
        let mut good = light_at("10.0.0.2:55443");
        good.expect_properties().returning(|| Ok(props("40")));
        let mut bad = light_at("10.0.0.3:55443");
        bad.expect_properties()
            .returning(|| Err(failure("10.0.0.3:55443")));

        let mut group = BulbGroup::new(vec![Box::new(good), Box::new(bad)], clock());

        let values = group.snapshot_property("bright");
        assert_eq!(
            values,
            vec![
                ("10.0.0.2:55443".to_string(), Some("40".to_string())),
                ("10.0.0.3:55443".to_string(), None),
            ]
        );

        assert_eq!(group.history().len(), 1);
        let latest = group.history().latest().unwrap();
        assert_eq!(
            latest[0].captured_at,
            parse_datetime("2024-01-15 18:00:00").unwrap()
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let mut light = light_at("10.0.0.2:55443");
        light.expect_properties().returning(|| Ok(props("40")));
        let mut group = BulbGroup::new(vec![Box::new(light)], clock());

        for _ in 0..(PROPERTY_HISTORY_CAPACITY + 5) {
            group.snapshot_properties();
        }

        assert_eq!(group.history().len(), PROPERTY_HISTORY_CAPACITY);
    }
}
