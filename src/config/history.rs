//! History log retention configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_history_max_length, default_shared_window_secs, default_true};

/// History configuration.
///
/// The rolling window of a single-viewer connection is derived from the
/// transport keepalive parameters; only shared connections use the fixed
/// window configured here.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Whether sent messages are recorded for replay.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of entries kept per connection.
    #[serde(default = "default_history_max_length")]
    pub max_length: usize,
    /// Rolling window for connections shared by several viewers.
    #[serde(default = "default_shared_window_secs")]
    pub shared_window_secs: u64,
}

impl HistoryConfig {
    /// Rolling window used for shared connections.
    pub fn shared_window(&self) -> Duration {
        Duration::from_secs(self.shared_window_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_length: default_history_max_length(),
            shared_window_secs: default_shared_window_secs(),
        }
    }
}
