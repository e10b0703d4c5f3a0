//! Application coordinator that manages the daemon's lifecycle.
//!
//! Acquires resources in order (configuration, instance lock, log sink,
//! signal handling, config watcher, bulb group), hands them to the polling
//! loop and releases them when it returns:
//!
//! ```no_run
//! use sundim::Sundim;
//!
//! # fn main() -> anyhow::Result<()> {
//! Sundim::new(false).run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    bulb,
    config::{self, Config},
    constants::EXIT_FAILURE,
    core::{Core, CoreParams, DailyScheduler},
    io::lock::{acquire_lock, default_lock_path, read_lock_pid},
    io::signals::setup_signal_handler,
    logger::Log,
    time_source::{RealTimeSource, TimeSource},
};

/// Builder for configuring and running the daemon.
pub struct Sundim {
    debug_enabled: bool,
    create_lock: bool,
}

impl Sundim {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
        }
    }

    /// Skip the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Run until SIGINT, SIGTERM or SIGHUP.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled");
        }

        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        let config_path = config::get_config_path()?;

        let _lock = if self.create_lock {
            let lock_path = default_lock_path();
            match acquire_lock(&lock_path)? {
                Some(lock) => Some(lock),
                None => {
                    log_pipe!();
                    match read_lock_pid(&lock_path) {
                        Some(pid) => log_error!("sundim is already running (PID: {pid})"),
                        None => log_error!("sundim is already running"),
                    }
                    log_end!();
                    std::process::exit(EXIT_FAILURE);
                }
            }
        } else {
            None
        };

        let _log_guard = match config.log_file_path() {
            Some(path) => Some(
                Log::start_file_logging(&path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?,
            ),
            None => {
                log_warning!("No log directory available, logging to stdout only");
                None
            }
        };

        config.log_config(&config_path);

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        if let Err(e) = config::start_config_watcher(
            signal_state.signal_sender.clone(),
            config_path.clone(),
            self.debug_enabled,
        ) {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot config reload disabled, use SIGUSR2 for manual reload");
        }

        let clock: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        let settings = config.schedule_settings()?;
        let bulbs = bulb::open_group(
            &config.light_addresses()?,
            config.command_timeout(),
            config.discovery_timeout(),
            clock.clone(),
        )?;

        let scheduler = DailyScheduler::new(settings, bulbs, clock.clone());
        Core::new(CoreParams {
            scheduler,
            signal_state,
            clock,
            poll_interval: config.poll_interval(),
            config_path,
            debug_enabled: self.debug_enabled,
        })
        .execute();

        log_end!();
        Ok(())
    }
}
