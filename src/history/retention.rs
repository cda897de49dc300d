//! Retention bounds of a connection's history log.

use std::time::Duration;

use crate::config::HistoryConfig;
use crate::transport::{SharingMode, TransportTimeouts};

/// Combined time and length bound, fixed for the life of an outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Entries older than this are evicted before the next append.
    pub window: Duration,
    /// Upper bound on retained entries.
    pub max_length: usize,
}

impl RetentionPolicy {
    /// Derive the bounds for one connection.
    ///
    /// Shared connections keep a fixed window since viewers come and go
    /// independently. A single viewer only needs history for as long as the
    /// transport may take to notice it left plus the page's reconnect grace.
    pub fn resolve(
        config: &HistoryConfig,
        sharing: SharingMode,
        timeouts: TransportTimeouts,
        reconnect_timeout: Duration,
    ) -> Self {
        let window = match sharing {
            SharingMode::Shared => config.shared_window(),
            SharingMode::Single => {
                timeouts.ping_interval + timeouts.ping_timeout + reconnect_timeout
            }
        };
        Self {
            window,
            max_length: config.max_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeouts() -> TransportTimeouts {
        TransportTimeouts {
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn single_viewer_window_sums_keepalive_and_grace() {
        let policy = RetentionPolicy::resolve(
            &HistoryConfig::default(),
            SharingMode::Single,
            timeouts(),
            Duration::from_secs(3),
        );
        assert_eq!(policy.window, Duration::from_secs(48));
        assert_eq!(policy.max_length, 1000);
    }

    #[test]
    fn shared_window_ignores_transport() {
        let config = HistoryConfig {
            shared_window_secs: 45,
            max_length: 10,
            ..Default::default()
        };
        let policy = RetentionPolicy::resolve(
            &config,
            SharingMode::Shared,
            timeouts(),
            Duration::from_secs(3),
        );
        assert_eq!(policy.window, Duration::from_secs(45));
        assert_eq!(policy.max_length, 10);
    }
}
