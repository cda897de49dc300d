//! Per-connection outbox.
//!
//! Producers queue element updates and point-to-point messages on an
//! [`Outbox`]; a background delivery loop coalesces updates, drains both
//! queues in batches and sends them through the [`Transport`], recording
//! every sent message in a bounded [`HistoryLog`] so that a reconnecting
//! client can be brought back in sync.
//!
//! Producers never block on delivery. The only shared state between them and
//! the loop is the pending work (one mutex), the history log (another mutex)
//! and the [`WakeSignal`].

mod coalescer;
mod delivery;
mod queue;
mod resync;
mod wake;

pub use coalescer::{PendingUpdate, UpdateCoalescer};
pub use queue::{MessageQueue, OutboundMessage};
pub use wake::WakeSignal;

use parking_lot::Mutex;
use resync_proto::{ElementId, Payload};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug, info};

use crate::config::{DeliveryConfig, HistoryConfig};
use crate::error::{DeliveryError, OutboxError};
use crate::fault::{FaultHandler, TracingFaultHandler};
use crate::history::{HistoryLog, HistoryStore, MemoryHistory, NoOpHistory};
use crate::runtime::Startup;
use crate::telemetry::{DeliveryTelemetry, HistoryStats, spans};
use crate::transport::{Connection, Element, Relay, Transport};

/// Everything an outbox needs from its surroundings.
pub struct OutboxParams {
    pub connection: Arc<dyn Connection>,
    pub transport: Arc<dyn Transport>,
    pub relay: Option<Arc<dyn Relay>>,
    pub faults: Arc<dyn FaultHandler>,
    pub telemetry: Arc<dyn DeliveryTelemetry>,
    pub history: HistoryConfig,
    pub delivery: DeliveryConfig,
}

impl OutboxParams {
    /// Params with default config, no relay, and the tracing fault handler.
    pub fn new(connection: Arc<dyn Connection>, transport: Arc<dyn Transport>) -> Self {
        Self {
            connection,
            transport,
            relay: None,
            faults: Arc::new(TracingFaultHandler),
            telemetry: Arc::new(HistoryStats::new()),
            history: HistoryConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }

    pub fn with_relay(mut self, relay: Arc<dyn Relay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_faults(mut self, faults: Arc<dyn FaultHandler>) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn DeliveryTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }
}

/// Work queued since the last drain.
#[derive(Default)]
struct PendingWork {
    updates: UpdateCoalescer,
    messages: MessageQueue,
}

/// Outbound pipeline of one client connection.
pub struct Outbox {
    connection: Arc<dyn Connection>,
    transport: Arc<dyn Transport>,
    relay: Option<Arc<dyn Relay>>,
    faults: Arc<dyn FaultHandler>,
    telemetry: Arc<dyn DeliveryTelemetry>,
    history_config: HistoryConfig,
    delivery_config: DeliveryConfig,
    pending: Mutex<PendingWork>,
    history: Mutex<HistoryLog>,
    wake: WakeSignal,
    stopped: AtomicBool,
}

impl Outbox {
    /// Create an outbox and hand its delivery loop to `startup`.
    ///
    /// The loop starts right away if `startup` has already run, otherwise
    /// when it does.
    pub fn new(params: OutboxParams, startup: &Startup) -> Arc<Self> {
        let store: Box<dyn HistoryStore> = if params.history.enabled {
            Box::new(MemoryHistory::new())
        } else {
            Box::new(NoOpHistory)
        };

        let outbox = Arc::new(Self {
            connection: params.connection,
            transport: params.transport,
            relay: params.relay,
            faults: params.faults,
            telemetry: params.telemetry,
            history_config: params.history,
            delivery_config: params.delivery,
            pending: Mutex::new(PendingWork::default()),
            history: Mutex::new(HistoryLog::new(store)),
            wake: WakeSignal::default(),
            stopped: AtomicBool::new(false),
        });

        let client_id = outbox.client_id().to_string();
        debug!(client = %client_id, "Outbox created");
        let span = spans::outbox(&client_id);
        startup.spawn(
            format!("outbox:{client_id}"),
            Arc::clone(&outbox).run().instrument(span),
        );
        outbox
    }

    pub fn client_id(&self) -> &str {
        self.connection.id()
    }

    /// Queue the current state of `element`, replacing anything pending for
    /// the same id.
    pub fn enqueue_update(&self, element: Arc<dyn Element>) -> Result<(), OutboxError> {
        self.enqueue(|pending| pending.updates.update(element))
    }

    /// Queue a deletion of `element_id`, replacing anything pending for it.
    pub fn enqueue_delete(&self, element_id: ElementId) -> Result<(), OutboxError> {
        self.enqueue(|pending| pending.updates.delete(element_id))
    }

    /// Append a message for `target` to the FIFO queue.
    pub fn enqueue_message(
        &self,
        message_type: &str,
        payload: Payload,
        target: &str,
    ) -> Result<(), OutboxError> {
        self.enqueue(|pending| {
            pending
                .messages
                .push(OutboundMessage::new(message_type, payload, target))
        })
    }

    fn enqueue(&self, push: impl FnOnce(&mut PendingWork)) -> Result<(), OutboxError> {
        self.connection.check_existence()?;
        {
            // Checked under the lock so nothing lands after stop() clears
            let mut pending = self.pending.lock();
            if self.is_stopped() {
                return Err(OutboxError::Stopped {
                    client_id: self.client_id().to_string(),
                });
            }
            push(&mut *pending);
        }
        self.wake.set();
        Ok(())
    }

    /// Stop the delivery loop and discard pending work. Later enqueues fail.
    /// Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let discarded = {
            let mut pending = self.pending.lock();
            let discarded = pending.updates.len() + pending.messages.len();
            pending.updates.clear();
            pending.messages.clear();
            discarded
        };
        info!(client = %self.client_id(), discarded, "Stopping outbox");
        self.wake.interrupt();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Messages recorded in history so far; the id of the last one sent.
    pub fn message_count(&self) -> u64 {
        self.history.lock().message_count()
    }

    /// Entries currently retained in history.
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// The combined `update` payload the next drain would send, built from
    /// the current pending state without consuming it.
    pub fn pending_update_payload(&self) -> Result<Option<Payload>, DeliveryError> {
        self.pending.lock().updates.build_payload()
    }

    /// Messages waiting in the FIFO queue.
    pub fn pending_messages(&self) -> usize {
        self.pending.lock().messages.len()
    }

    pub fn has_pending_work(&self) -> bool {
        let pending = self.pending.lock();
        !pending.updates.is_empty() || !pending.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::{ClientHandle, SharingMode, TransportTimeouts};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::time::Duration;

    #[derive(Default)]
    pub(super) struct Capture {
        pub sent: Mutex<Vec<(String, Value, String)>>,
        pub offline: AtomicBool,
        pub fail_types: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Capture {
        async fn emit(
            &self,
            message_type: &str,
            payload: &Payload,
            room: &str,
        ) -> Result<(), TransportError> {
            if self.fail_types.lock().iter().any(|t| t == message_type) {
                return Err(TransportError::Send("refused".into()));
            }
            self.sent
                .lock()
                .push((message_type.to_string(), payload.clone(), room.to_string()));
            Ok(())
        }

        fn is_live(&self, _client_id: &str) -> bool {
            !self.offline.load(Ordering::SeqCst)
        }

        fn timeouts(&self) -> TransportTimeouts {
            TransportTimeouts {
                ping_interval: Duration::from_secs(25),
                ping_timeout: Duration::from_secs(20),
            }
        }
    }

    pub(super) struct Widget(pub ElementId, pub Value);

    impl Element for Widget {
        fn id(&self) -> ElementId {
            self.0
        }

        fn to_payload(&self) -> Result<Payload, serde_json::Error> {
            Ok(self.1.clone())
        }
    }

    /// Outbox whose loop is never started; tests drive drains by hand.
    pub(super) fn parked_outbox() -> (Arc<Outbox>, Arc<Capture>, Arc<ClientHandle>) {
        let transport = Arc::new(Capture::default());
        let client = Arc::new(ClientHandle::new(
            "c1",
            SharingMode::Single,
            Duration::from_secs(3),
        ));
        let outbox = Outbox::new(
            OutboxParams::new(client.clone(), transport.clone()),
            &Startup::new(),
        );
        (outbox, transport, client)
    }

    #[test]
    fn coalesced_state_is_visible_before_drain() {
        let (outbox, _, _) = parked_outbox();
        outbox.enqueue_update(Arc::new(Widget(7, json!({"x": 1})))).unwrap();
        outbox.enqueue_update(Arc::new(Widget(7, json!({"x": 2})))).unwrap();
        assert_eq!(outbox.pending_update_payload().unwrap(), Some(json!({"7": {"x": 2}})));

        outbox.enqueue_delete(7).unwrap();
        assert_eq!(outbox.pending_update_payload().unwrap(), Some(json!({"7": null})));
    }

    #[test]
    fn enqueue_sets_wake_signal() {
        let (outbox, _, _) = parked_outbox();
        assert!(!outbox.wake.is_set());
        outbox.enqueue_message("notify", json!({}), "c1").unwrap();
        assert!(outbox.wake.is_set());
        assert_eq!(outbox.pending_messages(), 1);
    }

    #[test]
    fn enqueue_on_deleted_client_fails_and_queues_nothing() {
        let (outbox, _, client) = parked_outbox();
        client.delete();

        let err = outbox.enqueue_message("notify", json!({}), "c1").unwrap_err();
        assert_eq!(err.error_code(), "stale_connection");
        assert!(outbox.enqueue_update(Arc::new(Widget(1, json!(1)))).is_err());
        assert!(outbox.enqueue_delete(1).is_err());
        assert!(!outbox.has_pending_work());
        assert!(!outbox.wake.is_set());
    }

    #[test]
    fn stop_is_idempotent() {
        let (outbox, _, _) = parked_outbox();
        outbox.stop();
        outbox.stop();
        assert!(outbox.is_stopped());
    }

    #[test]
    fn stop_discards_pending_and_rejects_later_work() {
        let (outbox, _, _) = parked_outbox();
        outbox.enqueue_message("notify", json!({}), "c1").unwrap();
        outbox.enqueue_update(Arc::new(Widget(1, json!(1)))).unwrap();
        outbox.stop();
        assert!(!outbox.has_pending_work());

        let err = outbox.enqueue_message("notify", json!({}), "c1").unwrap_err();
        assert_eq!(err, OutboxError::Stopped { client_id: "c1".into() });
        assert!(outbox.enqueue_update(Arc::new(Widget(1, json!(1)))).is_err());
        assert!(outbox.enqueue_delete(1).is_err());
        assert!(!outbox.has_pending_work());
    }
}
