//! Unified error handling for the delivery outbox.
//!
//! Enqueue failures are returned to the caller. Everything that goes wrong
//! inside the delivery loop is wrapped in [`DeliveryError`] and handed to the
//! fault handler; the loop itself never exits on an error.

use resync_proto::ClientId;
use thiserror::Error;

// ============================================================================
// Producer Errors (enqueue operations)
// ============================================================================

/// Errors surfaced to code that enqueues work on an outbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboxError {
    /// The owning connection was torn down; nothing may be queued for it.
    #[error("client {client_id} no longer exists")]
    StaleConnection { client_id: ClientId },

    /// The outbox was stopped; its queues no longer accept work.
    #[error("outbox of client {client_id} is stopped")]
    Stopped { client_id: ClientId },
}

impl OutboxError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StaleConnection { .. } => "stale_connection",
            Self::Stopped { .. } => "stopped",
        }
    }
}

// ============================================================================
// Transport Errors (per-message sends)
// ============================================================================

/// Failure reported by a transport or relay while sending one message.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("room {0} is not connected")]
    NotConnected(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Delivery Errors (delivery loop faults)
// ============================================================================

/// Faults caught by the delivery loop and routed to the fault handler.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Sending one queued message through the primary transport failed.
    #[error("failed to send {message_type} to {target}: {source}")]
    Send {
        message_type: String,
        target: ClientId,
        #[source]
        source: TransportError,
    },

    /// Mirroring a delivered message to the relay failed.
    #[error("failed to relay {message_type} to {target}: {source}")]
    Relay {
        message_type: String,
        target: ClientId,
        #[source]
        source: TransportError,
    },

    /// A pending element could not be turned into a payload.
    #[error("failed to serialize element {element_id}: {source}")]
    Serialize {
        element_id: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl DeliveryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::Relay { .. } => "relay",
            Self::Serialize { .. } => "serialize",
        }
    }

    /// Whether the fault happened outside a per-message send boundary.
    ///
    /// The loop backs off before its next cycle after such a fault.
    pub fn is_loop_fault(&self) -> bool {
        matches!(self, Self::Serialize { .. })
    }
}
