//! Seams to the collaborators around an outbox.
//!
//! The outbox never talks to sockets or sessions directly. It sends through a
//! [`Transport`], optionally mirrors to a [`Relay`], asks its [`Connection`]
//! whether it still exists, and turns pending [`Element`]s into payloads.

use async_trait::async_trait;
use resync_proto::{ClientId, ElementId, Payload};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{OutboxError, TransportError};

/// Keepalive parameters of the underlying socket transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
}

/// Room-addressed message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one message to every socket in `room`.
    async fn emit(
        &self,
        message_type: &str,
        payload: &Payload,
        room: &str,
    ) -> Result<(), TransportError>;

    /// Whether `client_id` currently has a live socket.
    fn is_live(&self, client_id: &str) -> bool;

    /// Keepalive parameters, used to size the history window.
    fn timeouts(&self) -> TransportTimeouts;
}

/// Secondary service mirroring traffic to an external observer.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Whether traffic for `room` is mirrored.
    fn is_mirrored(&self, room: &str) -> bool;

    /// Forward one already-delivered message.
    async fn emit(
        &self,
        message_type: &str,
        payload: &Payload,
        room: &str,
    ) -> Result<(), TransportError>;
}

/// A renderable unit of state whose updates coalesce.
pub trait Element: Send + Sync {
    fn id(&self) -> ElementId;

    /// Serialize the element's current state. Called once per drain.
    fn to_payload(&self) -> Result<Payload, serde_json::Error>;
}

/// Whether a connection is viewed by one client or shared by several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingMode {
    #[default]
    Single,
    Shared,
}

/// The connection an outbox belongs to.
pub trait Connection: Send + Sync {
    /// Client id, also the room for the connection's own messages.
    fn id(&self) -> &str;

    /// Fail if the connection has already been torn down.
    fn check_existence(&self) -> Result<(), OutboxError>;

    fn sharing(&self) -> SharingMode;

    /// How long the client page waits for a reconnect before reloading.
    fn reconnect_timeout(&self) -> Duration;
}

/// Minimal [`Connection`] owned by whatever manages the session.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    sharing: SharingMode,
    reconnect_timeout: Duration,
    deleted: AtomicBool,
}

impl ClientHandle {
    pub fn new(id: impl Into<ClientId>, sharing: SharingMode, reconnect_timeout: Duration) -> Self {
        Self {
            id: id.into(),
            sharing,
            reconnect_timeout,
            deleted: AtomicBool::new(false),
        }
    }

    /// Mark the connection as torn down. Later enqueues fail.
    pub fn delete(&self) {
        self.deleted.store(true, Ordering::Release);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }
}

impl Connection for ClientHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn check_existence(&self) -> Result<(), OutboxError> {
        if self.is_deleted() {
            return Err(OutboxError::StaleConnection {
                client_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn sharing(&self) -> SharingMode {
        self.sharing
    }

    fn reconnect_timeout(&self) -> Duration {
        self.reconnect_timeout
    }
}
