//! Live outboxes keyed by client id.

use dashmap::DashMap;
use resync_proto::ClientId;
use std::sync::Arc;
use tracing::debug;

use crate::outbox::Outbox;

/// Concurrent map of connected clients to their outboxes.
#[derive(Default)]
pub struct OutboxRegistry {
    outboxes: DashMap<ClientId, Arc<Outbox>>,
}

impl OutboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `outbox` under its client id. A previous outbox for the same
    /// client is stopped and returned.
    pub fn register(&self, outbox: Arc<Outbox>) -> Option<Arc<Outbox>> {
        let client_id = outbox.client_id().to_string();
        let previous = self.outboxes.insert(client_id.clone(), outbox);
        if let Some(previous) = &previous {
            debug!(client = %client_id, "Replacing outbox");
            previous.stop();
        }
        previous
    }

    pub fn get(&self, client_id: &str) -> Option<Arc<Outbox>> {
        self.outboxes.get(client_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Stop and forget the outbox of `client_id`.
    pub fn remove(&self, client_id: &str) -> Option<Arc<Outbox>> {
        let (_, outbox) = self.outboxes.remove(client_id)?;
        outbox.stop();
        Some(outbox)
    }

    /// Stop every outbox. Used at shutdown.
    pub fn stop_all(&self) {
        for entry in self.outboxes.iter() {
            entry.value().stop();
        }
        self.outboxes.clear();
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }
}
