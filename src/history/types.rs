//! Type definitions for message history.

use resync_proto::ReplayedMessage;
use thiserror::Error;
use tokio::time::Instant;

/// One recorded message.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Sequence id, starting at 1.
    pub seq: u64,
    /// When the message was sent.
    pub timestamp: Instant,
    /// Type, stamped payload and target as sent.
    pub message: ReplayedMessage,
}

/// The messages a client needs are no longer retained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot replay from {requested}: oldest retained {oldest_retained:?}, count {message_count}")]
pub struct ResyncGap {
    /// First sequence id the client is missing.
    pub requested: u64,
    pub oldest_retained: Option<u64>,
    pub message_count: u64,
}
