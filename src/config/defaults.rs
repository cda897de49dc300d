//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "resyncd".to_string()
}

// =============================================================================
// History Defaults
// =============================================================================

pub fn default_history_max_length() -> usize {
    1000
}

pub fn default_shared_window_secs() -> u64 {
    30
}

// =============================================================================
// Delivery Defaults
// =============================================================================

pub fn default_wake_timeout_ms() -> u64 {
    1000
}

pub fn default_reconnect_poll_ms() -> u64 {
    100
}

pub fn default_fault_backoff_ms() -> u64 {
    100
}

// =============================================================================
// Transport Defaults
// =============================================================================

pub fn default_ping_interval_secs() -> u64 {
    25
}

pub fn default_ping_timeout_secs() -> u64 {
    20
}

pub fn default_reconnect_timeout_secs() -> u64 {
    3
}
