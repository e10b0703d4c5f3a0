//! Structured logging with box-drawing output and an append-only file sink.
//!
//! Every scheduling decision and bulb command is reported through the macros
//! defined here. Output always goes to stdout; when a sink file is installed with
//! [`Log::start_file_logging`] each line is also appended to it (ANSI colours
//! stripped, local timestamp prepended) and flushed before the macro returns.
//!
//! ## Logging Conventions
//!
//! - **`log_block_start!`**: opens a new conceptual block (daily reset, config load,
//!   discovery). Prints an empty pipe `┃` for spacing, then `┣ message`.
//! - **`log_decorated!`**: a line inside the current block, `┣ message`.
//! - **`log_indented!`**: nested detail of the previous line, `┃   message`.
//! - **`log_pipe!`**: a single empty `┃` line, used before `log_warning!`,
//!   `log_error!` and friends when they start a new block.
//! - **`log_version!`** / **`log_end!`**: startup header and final marker.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`**:
//!   semantic lines with a coloured `[LEVEL]` tag.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Installed once per process by `start_file_logging`.
static LOG_SINK: OnceLock<Mutex<Option<File>>> = OnceLock::new();

/// Main logging interface.
pub struct Log;

impl Log {
    /// Enable or disable all log output (tests run quiet).
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Open `path` in append mode and mirror every subsequent log line into it.
    ///
    /// The returned guard closes the sink when dropped. Only one sink can be
    /// installed per process.
    pub fn start_file_logging(path: &Path) -> Result<LoggerGuard> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        LOG_SINK
            .set(Mutex::new(Some(file)))
            .map_err(|_| anyhow::anyhow!("Log sink already initialized"))?;

        Ok(LoggerGuard { _private: () })
    }
}

/// Guard for the file sink; flushes and closes it on drop.
pub struct LoggerGuard {
    _private: (),
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        if let Some(sink) = LOG_SINK.get()
            && let Ok(mut guard) = sink.lock()
            && let Some(mut file) = guard.take()
        {
            let _ = file.flush();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route already-formatted output to stdout and, if installed, the file sink.
///
/// Public because the exported macros expand to calls of it.
pub fn write_output(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();

    let Some(sink) = LOG_SINK.get() else {
        return;
    };
    let Ok(mut guard) = sink.lock() else {
        return;
    };
    if let Some(file) = guard.as_mut() {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        for line in strip_ansi_codes(text).lines() {
            let _ = writeln!(file, "[{stamp}] {line}");
            let _ = file.flush();
        }
    }
}

// # Logging Macros

/// Shared expansion for all line-oriented macros. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($head:expr, $($arg:tt)+) => {{
        if $crate::logger::Log::is_enabled() {
            let message = format!($($arg)+);
            $crate::logger::write_output(&format!("{}{message}\n", $head));
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!("┣ ", $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!("┃   ", $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::write_output("┃\n");
        }
    }};
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!("┃\n┣ ", $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("┏ sundim v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::write_output("╹\n");
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[33mWARNING\x1b[0m] ", $($arg)+) };
}

/// Log an error message with pipe prefix and red-colored tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

/// Log an error that terminates the current flow, closing the pipe structure.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!("┃\n┗[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

/// Log an informational message with pipe prefix and green-colored tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[32mINFO\x1b[0m] ", $($arg)+) };
}

/// Log a debug/operational message with pipe prefix and green-colored tag.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[32mDEBUG\x1b[0m] ", $($arg)+) };
}

/// Log a critical message with pipe prefix and red-colored tag.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[31mCRITICAL\x1b[0m] ", $($arg)+) };
}
