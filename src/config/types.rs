//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::default_server_name;
use super::delivery::DeliveryConfig;
use super::history::HistoryConfig;
use super::transport::TransportConfig;
use super::validation::ValidationError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// History retention.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Delivery loop timing.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Transport keepalive parameters.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        super::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name used in logs (default: "resyncd").
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics HTTP port; no endpoint when unset.
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.name, "resyncd");
        assert!(config.server.metrics_port.is_none());
        assert_eq!(config.history.max_length, 1000);
        assert_eq!(config.delivery.wake_timeout_ms, 1000);
        assert_eq!(config.transport.ping_interval_secs, 25);
    }

    #[test]
    fn load_reads_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
name = "edge-1"
metrics_port = 9191

[history]
max_length = 200
shared_window_secs = 60

[delivery]
reconnect_poll_ms = 50

[transport]
ping_interval_secs = 10
ping_timeout_secs = 5
reconnect_timeout_secs = 2
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.name, "edge-1");
        assert_eq!(config.server.metrics_port, Some(9191));
        assert_eq!(config.history.max_length, 200);
        assert_eq!(config.history.shared_window_secs, 60);
        assert_eq!(config.delivery.reconnect_poll_ms, 50);
        assert_eq!(config.delivery.fault_backoff_ms, 100);
        assert_eq!(config.transport.reconnect_timeout_secs, 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[history\nmax_length = 1").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[history]\nmax_length = 0\n").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("history.max_length"));
    }
}
