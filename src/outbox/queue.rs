//! FIFO queue of point-to-point messages.

use resync_proto::{ClientId, Payload};
use std::collections::VecDeque;

/// One message waiting for the next drain.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub target: ClientId,
    pub message_type: String,
    pub payload: Payload,
}

impl OutboundMessage {
    pub fn new(
        message_type: impl Into<String>,
        payload: Payload,
        target: impl Into<ClientId>,
    ) -> Self {
        Self {
            target: target.into(),
            message_type: message_type.into(),
            payload,
        }
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: VecDeque<OutboundMessage>,
}

impl MessageQueue {
    pub fn push(&mut self, message: OutboundMessage) {
        self.messages.push_back(message);
    }

    /// Remove every queued message, oldest first.
    pub fn take(&mut self) -> VecDeque<OutboundMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
