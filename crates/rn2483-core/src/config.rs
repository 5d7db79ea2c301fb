//! Module configuration: serial settings and transaction timings.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::PollPolicy;
use crate::protocol::constants::*;

/// Long-running operations that poll for an asynchronous outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Join,
    Uplink,
    RadioTx,
    RadioRx,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Join => "mac join",
            Operation::Uplink => "mac tx",
            Operation::RadioTx => "radio tx",
            Operation::RadioRx => "radio rx",
        }
    }
}

/// Configuration for a module connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Serial device path.
    pub port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// How long one serial read waits for data.
    pub read_timeout_ms: u64,
    /// Interval between poll reads while waiting for an async event.
    pub tick_interval_ms: u64,
    pub join_timeout_ms: u64,
    pub uplink_timeout_ms: u64,
    pub radio_tx_timeout_ms: u64,
    /// Deadline for `radio rx` when the caller supplies none.
    pub rx_timeout_ms: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT.as_millis() as u64,
            uplink_timeout_ms: DEFAULT_UPLINK_TIMEOUT.as_millis() as u64,
            radio_tx_timeout_ms: DEFAULT_RADIO_TX_TIMEOUT.as_millis() as u64,
            rx_timeout_ms: DEFAULT_RX_TIMEOUT.as_millis() as u64,
        }
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) { "COM1" } else { "/dev/ttyUSB0" }
}

impl ModuleConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ModuleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Default deadline for an operation.
    pub fn timeout(&self, operation: Operation) -> Duration {
        let ms = match operation {
            Operation::Join => self.join_timeout_ms,
            Operation::Uplink => self.uplink_timeout_ms,
            Operation::RadioTx => self.radio_tx_timeout_ms,
            Operation::RadioRx => self.rx_timeout_ms,
        };
        Duration::from_millis(ms)
    }

    /// Polling cadence and deadline for an operation.
    pub fn poll_policy(&self, operation: Operation) -> PollPolicy {
        PollPolicy {
            tick: self.tick_interval(),
            deadline: self.timeout(operation),
        }
    }
}
