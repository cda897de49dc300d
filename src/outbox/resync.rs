//! Reconnect resynchronization.
//!
//! A client that reconnects reports the id of the last message it applied.
//! If history still holds everything after that id, the missed messages are
//! queued back to the client in one `synchronize` response. If anything in
//! between was evicted, the client has to reload instead.

use resync_proto::{SYNCHRONIZE, SyncRequest, SyncResponse};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::Outbox;
use crate::error::OutboxError;
use crate::telemetry::spans;

impl Outbox {
    /// Id a freshly connected client starts counting from.
    pub fn starting_message_id(&self) -> u64 {
        self.message_count()
    }

    /// Queue a replay of everything after `last_message_id`.
    ///
    /// Returns `Ok(false)` when history cannot cover the gap, in which case
    /// nothing is queued.
    pub fn synchronize(
        &self,
        last_message_id: u64,
        retransmit_id: &str,
    ) -> Result<bool, OutboxError> {
        let _span = spans::resync(self.client_id(), last_message_id).entered();
        self.connection.check_existence()?;

        let started = Instant::now();
        let (message_count, replay) = {
            let history = self.history.lock();
            (history.message_count(), history.replay(last_message_id))
        };

        let messages = match replay {
            Ok(messages) => messages,
            Err(gap) => {
                crate::metrics::record_resync("gap");
                debug!(%gap, "History cannot cover resync");
                return Ok(false);
            }
        };
        self.telemetry
            .record_replay(self.client_id(), messages.len(), started.elapsed());

        let response = SyncResponse {
            starting_message_id: message_count,
            messages,
            retransmit_id: retransmit_id.to_string(),
        };
        let payload = match serde_json::to_value(&response) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode resync response");
                return Ok(false);
            }
        };

        let target = self.client_id().to_string();
        self.enqueue_message(SYNCHRONIZE, payload, &target)?;
        crate::metrics::record_resync("replayed");
        Ok(true)
    }

    /// Handle a handshake from a reconnecting client.
    pub fn handle_handshake(&self, request: &SyncRequest) -> Result<bool, OutboxError> {
        let replayed = self.synchronize(request.last_message_id, &request.retransmit_id)?;
        if replayed {
            info!(
                client = %self.client_id(),
                last_message_id = request.last_message_id,
                "Client resynchronized"
            );
        } else {
            info!(
                client = %self.client_id(),
                last_message_id = request.last_message_id,
                "Client must reload; history has a gap"
            );
        }
        Ok(replayed)
    }
}
