//! Resynchronization request and response shapes.

use serde::{Deserialize, Serialize};

use crate::message::{ClientId, Payload};

/// Sent by a reconnecting client: the last message id it applied and a
/// fresh token to recognise the matching response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Sequence id of the last message the client applied.
    pub last_message_id: u64,
    /// Opaque token echoed back unchanged.
    pub retransmit_id: String,
}

impl SyncRequest {
    /// Build a request.
    pub fn new(last_message_id: u64, retransmit_id: impl Into<String>) -> Self {
        Self {
            last_message_id,
            retransmit_id: retransmit_id.into(),
        }
    }
}

/// One replayed history entry, serialized as `[type, payload, target]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayedMessage(pub String, pub Payload, pub ClientId);

impl ReplayedMessage {
    /// Message type.
    pub fn message_type(&self) -> &str {
        &self.0
    }

    /// Stamped payload as originally sent.
    pub fn payload(&self) -> &Payload {
        &self.1
    }

    /// Room the message was addressed to.
    pub fn target(&self) -> &str {
        &self.2
    }
}

/// Payload of a `synchronize` message.
///
/// `starting_message_id` is the outbox's total count at the time of the
/// response, not the id of the first replayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Total history-eligible messages sent on the connection.
    pub starting_message_id: u64,
    /// Missed messages, oldest first.
    pub messages: Vec<ReplayedMessage>,
    /// Token copied from the request.
    pub retransmit_id: String,
}
