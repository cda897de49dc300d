//! Recording doubles for the transport seams.

use async_trait::async_trait;
use parking_lot::Mutex;
use resync_outbox::error::{DeliveryError, TransportError};
use resync_outbox::{FaultHandler, Relay, Transport, TransportTimeouts};
use resync_proto::Payload;
use std::collections::HashSet;
use std::time::Duration;

/// One frame handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub message_type: String,
    pub payload: Payload,
    pub room: String,
}

/// Records every emitted frame. Rooms can be taken offline and message
/// types can be made to fail.
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    offline: Mutex<HashSet<String>>,
    failing_types: Mutex<HashSet<String>>,
    timeouts: TransportTimeouts,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::with_timeouts(TransportTimeouts {
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(20),
        })
    }
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn with_timeouts(timeouts: TransportTimeouts) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            offline: Mutex::new(HashSet::new()),
            failing_types: Mutex::new(HashSet::new()),
            timeouts,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn sent_types(&self) -> Vec<String> {
        self.sent.lock().iter().map(|s| s.message_type.clone()).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn set_offline(&self, room: &str, offline: bool) {
        let mut rooms = self.offline.lock();
        if offline {
            rooms.insert(room.to_string());
        } else {
            rooms.remove(room);
        }
    }

    pub fn fail_type(&self, message_type: &str) {
        self.failing_types.lock().insert(message_type.to_string());
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn emit(
        &self,
        message_type: &str,
        payload: &Payload,
        room: &str,
    ) -> Result<(), TransportError> {
        if self.failing_types.lock().contains(message_type) {
            return Err(TransportError::Send(format!("{message_type} refused")));
        }
        self.sent.lock().push(Sent {
            message_type: message_type.to_string(),
            payload: payload.clone(),
            room: room.to_string(),
        });
        Ok(())
    }

    fn is_live(&self, client_id: &str) -> bool {
        !self.offline.lock().contains(client_id)
    }

    fn timeouts(&self) -> TransportTimeouts {
        self.timeouts
    }
}

/// Mirrors frames for a fixed set of rooms. Can be switched to refuse
/// every frame.
#[derive(Default)]
pub struct RecordingRelay {
    mirrored: Mutex<HashSet<String>>,
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<bool>,
}

#[allow(dead_code)]
impl RecordingRelay {
    pub fn mirroring(rooms: &[&str]) -> Self {
        Self {
            mirrored: Mutex::new(rooms.iter().map(|r| r.to_string()).collect()),
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Relay for RecordingRelay {
    fn is_mirrored(&self, room: &str) -> bool {
        self.mirrored.lock().contains(room)
    }

    async fn emit(
        &self,
        message_type: &str,
        payload: &Payload,
        room: &str,
    ) -> Result<(), TransportError> {
        if *self.failing.lock() {
            return Err(TransportError::NotConnected(room.to_string()));
        }
        self.sent.lock().push(Sent {
            message_type: message_type.to_string(),
            payload: payload.clone(),
            room: room.to_string(),
        });
        Ok(())
    }
}

/// Collects the error code of every reported fault.
#[derive(Default)]
pub struct RecordingFaults {
    codes: Mutex<Vec<&'static str>>,
}

#[allow(dead_code)]
impl RecordingFaults {
    pub fn codes(&self) -> Vec<&'static str> {
        self.codes.lock().clone()
    }
}

impl FaultHandler for RecordingFaults {
    fn report(&self, _client_id: &str, error: &DeliveryError) {
        self.codes.lock().push(error.error_code());
    }
}
