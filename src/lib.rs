//! # Sundim Library
//!
//! Internal library for the sundim binary: dims a group of smart bulbs from
//! sunset to bedtime and re-plans every day.
//!
//! This library exists to enable testing of the scheduling internals and to
//! keep CLI dispatch (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Sundim` acquires resources and runs the daemon
//! - **Core Logic**: `core` holds the dimming plan, the trigger table, the
//!   daily scheduler and the polling loop
//! - **Geographic**: `geo` computes sunrise and sunset for the configured coordinate
//! - **Bulbs**: `bulb` drives Yeelight bulbs as one group and discovers them
//! - **Configuration**: `config` for TOML-based settings with hot reload
//! - **Commands**: `commands` for one-shot CLI commands (plan, sun, on, off, ...)
//! - **Infrastructure**: signal handling, instance lock, time source and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod bulb;
pub mod commands;
pub mod config;
pub mod constants;
pub mod core;
pub mod geo;
pub mod io;
pub mod time_source;

// Internal modules
mod sundim;

pub use sundim::Sundim;
