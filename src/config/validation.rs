//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("history.max_length must be at least 1")]
    ZeroHistoryLength,
    #[error("delivery.wake_timeout_ms must be at least 1")]
    ZeroWakeTimeout,
    #[error("delivery.reconnect_poll_ms must be at least 1")]
    ZeroReconnectPoll,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.history.max_length == 0 {
        errors.push(ValidationError::ZeroHistoryLength);
    }

    // A zero wait would turn the idle loop into a busy spin
    if config.delivery.wake_timeout_ms == 0 {
        errors.push(ValidationError::ZeroWakeTimeout);
    }
    if config.delivery.reconnect_poll_ms == 0 {
        errors.push(ValidationError::ZeroReconnectPoll);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = Config::default();
        config.server.name.clear();
        config.history.max_length = 0;
        config.delivery.wake_timeout_ms = 0;
        config.delivery.reconnect_poll_ms = 0;

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::MissingServerName));
        assert!(matches!(errors[1], ValidationError::ZeroHistoryLength));
    }
}
