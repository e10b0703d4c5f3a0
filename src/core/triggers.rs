//! Time-of-day triggers polled by the main loop.
//!
//! A trigger fires at most once per calendar day at its time-of-day. It is armed
//! for the first occurrence strictly after registration, and re-armed for the
//! next occurrence strictly after each firing. A table is built in full and then
//! swapped in by the scheduler; it is never cleared piecemeal.

use chrono::{DateTime, Duration, Local, NaiveTime};

use crate::time_source::combine_local;

/// What a trigger does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Discard the table and plan the day again.
    DailyReset,
    /// Sunset anchor: power the group on, then set full brightness.
    TurnOn { brightness: u8 },
    /// One dimming step.
    SetBrightness(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    at: NaiveTime,
    action: TriggerAction,
    next_run: DateTime<Local>,
}

impl Trigger {
    pub fn at(&self) -> NaiveTime {
        self.at
    }

    pub fn action(&self) -> TriggerAction {
        self.action
    }

    pub fn next_run(&self) -> DateTime<Local> {
        self.next_run
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerTable {
    triggers: Vec<Trigger>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` to run daily at `at`, counting from `now`.
    ///
    /// Duplicate times are allowed; each registration fires independently.
    pub fn register(&mut self, at: NaiveTime, action: TriggerAction, now: DateTime<Local>) {
        self.triggers.push(Trigger {
            at,
            action,
            next_run: next_occurrence(at, now),
        });
    }

    /// Take the earliest trigger whose armed instant has passed and re-arm it.
    ///
    /// Ties resolve in registration order. Call repeatedly until `None` to drain
    /// everything due in one poll.
    pub fn pop_due(&mut self, now: DateTime<Local>) -> Option<TriggerAction> {
        let trigger = self
            .triggers
            .iter_mut()
            .filter(|t| t.next_run <= now)
            .min_by_key(|t| t.next_run)?;

        trigger.next_run = next_occurrence(trigger.at, now);
        Some(trigger.action)
    }

    /// Earliest armed instant, if any trigger is registered.
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.triggers.iter().map(|t| t.next_run).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// First instant with time-of-day `at` strictly after `after`.
fn next_occurrence(at: NaiveTime, after: DateTime<Local>) -> DateTime<Local> {
    let today = after.date_naive();
    if let Some(candidate) = combine_local(today, at)
        && candidate > after
    {
        return candidate;
    }

    today
        .succ_opt()
        .and_then(|tomorrow| combine_local(tomorrow, at))
        .unwrap_or(after + Duration::days(1))
}
