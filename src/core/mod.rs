//! Core scheduling logic and the daemon's polling loop.
//!
//! - [`plan`]: the pure sunset-to-sleep [`DimPlan`] computation
//! - [`triggers`]: the time-of-day trigger table
//! - [`scheduler`]: [`DailyScheduler`], which rebuilds the table every day
//!
//! The [`Core`] struct owns the scheduler for the life of the process. It wakes
//! every poll interval, applies pending reloads and lets the scheduler fire what
//! is due. Nothing else touches the scheduler, so no locking is needed.

pub mod error;
pub mod plan;
pub mod scheduler;
pub mod triggers;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use error::ScheduleError;
pub use plan::{BrightnessRange, DimPlan, DimStep};
pub use scheduler::{DailyScheduler, ScheduleSettings};
pub use triggers::{Trigger, TriggerAction, TriggerTable};

use crate::config;
use crate::io::signals::{SignalState, handle_signal_message};
use crate::time_source::TimeSource;

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub scheduler: DailyScheduler,
    pub signal_state: SignalState,
    pub clock: Arc<dyn TimeSource>,
    pub poll_interval: Duration,
    /// File reread on reload requests.
    pub config_path: PathBuf,
    pub debug_enabled: bool,
}

/// The polling loop.
pub(crate) struct Core {
    scheduler: DailyScheduler,
    signal_state: SignalState,
    clock: Arc<dyn TimeSource>,
    poll_interval: Duration,
    config_path: PathBuf,
    debug_enabled: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            scheduler: params.scheduler,
            signal_state: params.signal_state,
            clock: params.clock,
            poll_interval: params.poll_interval,
            config_path: params.config_path,
            debug_enabled: params.debug_enabled,
        }
    }

    /// Plan today, then poll until a shutdown is requested.
    pub fn execute(mut self) {
        // A failed startup plan is logged and retried from the loop
        let _ = self.scheduler.daily_reset();

        while self.signal_state.is_running() {
            while let Some(message) = self.signal_state.try_next() {
                if handle_signal_message(message, &self.signal_state) {
                    self.reload();
                }
            }
            if !self.signal_state.is_running() {
                break;
            }

            self.scheduler.tick();
            self.clock.sleep(self.poll_interval);
        }

        log_block_start!("Shutting down");
    }

    fn reload(&mut self) {
        log_block_start!("Reloading configuration");
        let loaded = config::load_from_path(&self.config_path)
            .and_then(|config| Ok((config.schedule_settings()?, config.poll_interval())));

        match loaded {
            Ok((settings, poll_interval)) => {
                if poll_interval != self.poll_interval {
                    log_decorated!("Poll interval: {}ms", poll_interval.as_millis());
                    self.poll_interval = poll_interval;
                }
                self.scheduler.reconfigure(settings);
            }
            Err(e) => {
                log_error!("Failed to reload config: {e:#}");
                log_indented!("Continuing with previous configuration");
            }
        }

        if self.debug_enabled && let Some(next) = self.scheduler.triggers().next_due() {
            log_debug!("Next trigger at {}", next.format("%Y-%m-%d %H:%M:%S"));
        }
    }
}
