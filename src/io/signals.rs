//! Process signal handling.
//!
//! A background thread turns SIGINT, SIGTERM and SIGHUP into a shutdown and
//! SIGUSR2 into a configuration reload. The main loop drains the channel between
//! polls; the running flag lets it stop without waiting for the next message.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

/// Messages delivered to the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reread the configuration file (SIGUSR2 or a change on disk).
    Reload,
    /// Stop the main loop (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared when the application should stop.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned into other producers such as the config watcher.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// State with no OS handlers attached; messages arrive only through `signal_sender`.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Next pending message without blocking.
    pub fn try_next(&self) -> Option<SignalMessage> {
        self.signal_receiver.try_recv().ok()
    }
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that monitors for signals and forwards them as
/// [`SignalMessage`]s.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGUSR2 => {
                    log_pipe!();
                    log_info!("Received configuration reload signal");
                    if sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                }
                SIGINT | SIGTERM | SIGHUP => {
                    log_pipe!();
                    match (sig, debug_enabled) {
                        (SIGINT, true) => log_info!("Received SIGINT (Ctrl+C), shutting down..."),
                        (SIGHUP, _) => log_info!("Received hangup, shutting down..."),
                        _ => log_info!("Received termination request, shutting down..."),
                    }

                    running.store(false, Ordering::SeqCst);
                    if let Err(e) = sender.send(SignalMessage::Shutdown) {
                        log_warning!("Failed to send shutdown message: {e}");
                    }
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(state)
}

/// Apply a shutdown message to the shared state. Returns `true` for reloads.
pub fn handle_signal_message(message: SignalMessage, state: &SignalState) -> bool {
    match message {
        SignalMessage::Shutdown => {
            state.running.store(false, Ordering::SeqCst);
            false
        }
        SignalMessage::Reload => true,
    }
}
