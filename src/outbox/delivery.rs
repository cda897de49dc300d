//! The delivery loop.
//!
//! Each cycle waits for the wake signal, checks the client is reachable,
//! snapshots the pending work and sends it: the coalesced `update` first,
//! then queued messages in FIFO order. Send failures are reported per message
//! and never stop the cycle; anything else is reported and followed by a
//! short backoff. The loop only exits once the outbox is stopped.

use resync_proto::{SYNCHRONIZE, UPDATE, stamp_message_id};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{OutboundMessage, Outbox};
use crate::error::DeliveryError;
use crate::history::RetentionPolicy;

impl Outbox {
    /// Body of the background task. Runs until [`Outbox::stop`].
    pub(crate) async fn run(self: Arc<Self>) {
        info!("Delivery loop started");

        while !self.is_stopped() {
            if !self.wake.is_set() {
                self.wake.wait(self.delivery_config.wake_timeout()).await;
                continue;
            }

            if !self.transport.is_live(self.client_id()) {
                tokio::time::sleep(self.delivery_config.reconnect_poll()).await;
                continue;
            }

            if let Err(fault) = self.drain().await {
                self.faults.report(self.client_id(), &fault);
                if fault.is_loop_fault() {
                    tokio::time::sleep(self.delivery_config.fault_backoff()).await;
                }
            }
        }

        info!("Delivery loop stopped");
    }

    /// One drain cycle.
    ///
    /// Returns an error only when the pending updates cannot be serialized;
    /// in that case nothing is taken off the queues.
    pub(crate) async fn drain(&self) -> Result<(), DeliveryError> {
        self.wake.clear();

        let (update, messages) = {
            let mut pending = self.pending.lock();
            let update = pending.updates.build_payload()?;
            pending.updates.clear();
            (update, pending.messages.take())
        };

        let mut batch = Vec::with_capacity(messages.len() + 1);
        if let Some(payload) = update {
            batch.push(OutboundMessage::new(UPDATE, payload, self.client_id()));
        }
        batch.extend(messages);

        if batch.is_empty() {
            return Ok(());
        }
        debug!(batch = batch.len(), "Draining outbox");

        for message in batch {
            if let Err(fault) = self.emit(message).await {
                self.faults.report(self.client_id(), &fault);
            }
        }
        Ok(())
    }

    /// Record `message` in history (unless it is a resync response), stamp
    /// its sequence id, send it, then mirror it to the relay.
    async fn emit(&self, mut message: OutboundMessage) -> Result<(), DeliveryError> {
        if message.message_type != SYNCHRONIZE {
            let started = Instant::now();
            let history_len = {
                let mut history = self.history.lock();
                stamp_message_id(&mut message.payload, history.next_id());
                history.record(
                    &message.message_type,
                    message.payload.clone(),
                    &message.target,
                    tokio::time::Instant::now(),
                    || self.retention_policy(),
                );
                history.len()
            };
            self.telemetry
                .record_append(self.client_id(), started.elapsed(), history_len);
        }

        if let Err(source) = self
            .transport
            .emit(&message.message_type, &message.payload, &message.target)
            .await
        {
            crate::metrics::record_send_failure();
            return Err(DeliveryError::Send {
                message_type: message.message_type,
                target: message.target,
                source,
            });
        }
        crate::metrics::record_sent();

        if let Some(relay) = &self.relay
            && relay.is_mirrored(&message.target)
        {
            relay
                .emit(&message.message_type, &message.payload, &message.target)
                .await
                .map_err(|source| DeliveryError::Relay {
                    message_type: message.message_type,
                    target: message.target,
                    source,
                })?;
        }
        Ok(())
    }

    fn retention_policy(&self) -> RetentionPolicy {
        let policy = RetentionPolicy::resolve(
            &self.history_config,
            self.connection.sharing(),
            self.transport.timeouts(),
            self.connection.reconnect_timeout(),
        );
        debug!(
            window_ms = policy.window.as_millis() as u64,
            max_length = policy.max_length,
            "Resolved history retention"
        );
        policy
    }
}
