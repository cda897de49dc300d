//! Delivery loop timing configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_fault_backoff_ms, default_reconnect_poll_ms, default_wake_timeout_ms,
};

/// Timing of the per-connection delivery loop.
///
/// - `wake_timeout_ms`: longest wait for new work before re-checking stop (default: 1000)
/// - `reconnect_poll_ms`: pause while the connection is not live (default: 100)
/// - `fault_backoff_ms`: pause after a fault outside a send (default: 100)
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_wake_timeout_ms")]
    pub wake_timeout_ms: u64,

    #[serde(default = "default_reconnect_poll_ms")]
    pub reconnect_poll_ms: u64,

    #[serde(default = "default_fault_backoff_ms")]
    pub fault_backoff_ms: u64,
}

impl DeliveryConfig {
    pub fn wake_timeout(&self) -> Duration {
        Duration::from_millis(self.wake_timeout_ms)
    }

    pub fn reconnect_poll(&self) -> Duration {
        Duration::from_millis(self.reconnect_poll_ms)
    }

    pub fn fault_backoff(&self) -> Duration {
        Duration::from_millis(self.fault_backoff_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            wake_timeout_ms: default_wake_timeout_ms(),
            reconnect_poll_ms: default_reconnect_poll_ms(),
            fault_backoff_ms: default_fault_backoff_ms(),
        }
    }
}
