//! Transport keepalive configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_ping_interval_secs, default_ping_timeout_secs, default_reconnect_timeout_secs,
};
use crate::transport::TransportTimeouts;

/// Keepalive parameters of the socket transport.
///
/// A single-viewer connection keeps history for
/// `ping_interval + ping_timeout + reconnect_timeout`: the longest a client
/// can be gone before the transport gives up on it and it has to reload.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Seconds between transport pings (default: 25).
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before the socket is dropped (default: 20).
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    /// Grace period a page allows for reconnecting (default: 3).
    #[serde(default = "default_reconnect_timeout_secs")]
    pub reconnect_timeout_secs: u64,
}

impl TransportConfig {
    pub fn timeouts(&self) -> TransportTimeouts {
        TransportTimeouts {
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            ping_timeout: Duration::from_secs(self.ping_timeout_secs),
        }
    }

    pub fn reconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.reconnect_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
            reconnect_timeout_secs: default_reconnect_timeout_secs(),
        }
    }
}
