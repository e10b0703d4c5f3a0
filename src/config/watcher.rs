//! File watching module for hot config reloading.
//!
//! Watches the directory holding `sundim.toml` and turns changes to that file
//! into [`SignalMessage::Reload`] messages for the main loop. The directory is
//! watched rather than the file because editors often replace the file.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use crate::constants::CONFIG_WATCH_DEBOUNCE;
use crate::io::signals::SignalMessage;

/// Configuration file watcher that monitors for changes and triggers reloads.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_path: PathBuf, debug_enabled: bool) -> Self {
        Self {
            signal_sender,
            debug_enabled,
            config_path,
        }
    }

    /// Start watching in a background thread.
    pub fn start(self) -> Result<()> {
        let Some(config_dir) = self.config_path.parent().map(Path::to_path_buf) else {
            return Ok(());
        };
        if !config_dir.is_dir() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("No configuration directory to watch for hot reload");
            }
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", config_dir.display()))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching {} for changes", self.config_path.display());
        }

        let ConfigWatcher {
            signal_sender,
            debug_enabled,
            config_path,
        } = self;

        thread::spawn(move || {
            // The watcher stops when dropped, so it lives in this thread
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !affects_config(&event, &config_path) {
                    continue;
                }

                if last_reload.is_some_and(|at| at.elapsed() < CONFIG_WATCH_DEBOUNCE) {
                    continue;
                }

                if debug_enabled {
                    log_pipe!();
                    log_info!("Configuration file change detected");
                }

                if signal_sender.send(SignalMessage::Reload).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Whether `event` touches the config file itself.
fn affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(config_name) = config_path.file_name() else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(config_name))
}

/// Start the configuration file watcher.
///
/// This is called from the main application to enable hot config reloading.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(signal_sender, config_path, debug_enabled).start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_only_the_config_file_counts() {
        let config = PathBuf::from("/home/user/.config/sundim/sundim.toml");

        let edit = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/home/user/.config/sundim/sundim.toml"));
        assert!(affects_config(&edit, &config));

        let swap = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/home/user/.config/sundim/.sundim.toml.swp"));
        assert!(!affects_config(&swap, &config));
    }
}
