//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Root config struct, server identity and loading
//! - [`history`]: History log retention (HistoryConfig)
//! - [`delivery`]: Delivery loop timing (DeliveryConfig)
//! - [`transport`]: Transport keepalive parameters (TransportConfig)
//! - [`validation`]: Startup validation

mod defaults;
mod delivery;
mod history;
mod transport;
mod types;
mod validation;

pub use delivery::DeliveryConfig;
pub use history::HistoryConfig;
pub use transport::TransportConfig;
pub use types::{Config, ConfigError, ServerConfig};
pub use validation::{ValidationError, validate};
