//! Smart bulbs as one logical group.
//!
//! The scheduler only talks to [`BulbGroup`]. How a single light is reached is
//! behind the [`Light`] trait; [`yeelight::YeelightBulb`] implements it over the
//! LAN control protocol and [`discovery`] finds bulbs when no addresses are
//! configured.

pub mod discovery;
pub mod group;
pub mod history;
pub mod yeelight;

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub use group::{BulbGroup, GroupReport, LightOutcome, PropertyReading};
pub use history::PropertyHistory;

use crate::time_source::TimeSource;
use yeelight::YeelightBulb;

/// Property name to raw value, as reported by the bulb.
pub type PropertyMap = BTreeMap<String, String>;

/// A single light failed to carry out a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulbCommandError {
    pub address: String,
    pub message: String,
}

impl BulbCommandError {
    pub fn new(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BulbCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.message)
    }
}

impl std::error::Error for BulbCommandError {}

/// One addressable light.
///
/// Every call must return within a bounded time; implementations own their
/// network timeouts.
#[cfg_attr(test, mockall::automock)]
pub trait Light: Send {
    /// Network address used in log lines and reports.
    fn address(&self) -> String;

    fn set_power(&mut self, on: bool) -> Result<(), BulbCommandError>;

    fn toggle(&mut self) -> Result<(), BulbCommandError>;

    /// `percent` is clamped to what the device accepts.
    fn set_brightness(&mut self, percent: u8) -> Result<(), BulbCommandError>;

    /// Current values of the standard property set.
    fn properties(&mut self) -> Result<PropertyMap, BulbCommandError>;
}

/// Build the group from configured addresses, or discover bulbs when none are given.
pub fn open_group(
    addresses: &[SocketAddr],
    command_timeout: Duration,
    discovery_timeout: Duration,
    clock: Arc<dyn TimeSource>,
) -> Result<BulbGroup> {
    let addresses = if addresses.is_empty() {
        log_block_start!("Discovering bulbs on the local network...");
        let found = discovery::discover(discovery_timeout)?;
        if found.is_empty() {
            log_warning!("No bulbs answered the discovery request");
        }
        found
    } else {
        addresses.to_vec()
    };

    for address in &addresses {
        log_indented!("Bulb: {}", address);
    }

    let lights: Vec<Box<dyn Light>> = addresses
        .into_iter()
        .map(|address| Box::new(YeelightBulb::new(address, command_timeout)) as Box<dyn Light>)
        .collect();

    Ok(BulbGroup::new(lights, clock))
}
