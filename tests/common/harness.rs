//! A single client wired to an outbox and recording doubles.

use parking_lot::Mutex;
use resync_outbox::config::{DeliveryConfig, HistoryConfig};
use resync_outbox::{
    ClientHandle, Element, Outbox, OutboxParams, Relay, SharingMode, Startup,
};
use resync_proto::{ElementId, Payload};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::transport::{RecordingFaults, RecordingTransport};

/// Element with mutable state and a switch to make serialization fail.
pub struct TestElement {
    id: ElementId,
    state: Mutex<Value>,
    broken: Mutex<bool>,
}

#[allow(dead_code)]
impl TestElement {
    pub fn new(id: ElementId, state: Value) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: Mutex::new(state),
            broken: Mutex::new(false),
        })
    }

    pub fn set(&self, state: Value) {
        *self.state.lock() = state;
    }

    pub fn set_broken(&self, broken: bool) {
        *self.broken.lock() = broken;
    }
}

impl Element for TestElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn to_payload(&self) -> Result<Payload, serde_json::Error> {
        if *self.broken.lock() {
            return serde_json::from_str("{broken");
        }
        Ok(self.state.lock().clone())
    }
}

/// A connected client and everything its outbox talks to.
pub struct TestClient {
    pub outbox: Arc<Outbox>,
    pub transport: Arc<RecordingTransport>,
    pub faults: Arc<RecordingFaults>,
    pub handle: Arc<ClientHandle>,
}

#[allow(dead_code)]
impl TestClient {
    /// A client whose delivery loop is running.
    pub fn connect(id: &str) -> Self {
        Self::builder(id).build(&Startup::running())
    }

    pub fn builder(id: &str) -> TestClientBuilder {
        TestClientBuilder {
            id: id.to_string(),
            sharing: SharingMode::Single,
            history: HistoryConfig::default(),
            delivery: DeliveryConfig::default(),
            relay: None,
        }
    }

    /// Wait until `count` frames were sent or five seconds of (possibly
    /// paused) time pass.
    pub async fn wait_for_sent(&self, count: usize) -> bool {
        for _ in 0..500 {
            if self.transport.sent().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

pub struct TestClientBuilder {
    id: String,
    sharing: SharingMode,
    history: HistoryConfig,
    delivery: DeliveryConfig,
    relay: Option<Arc<dyn Relay>>,
}

#[allow(dead_code)]
impl TestClientBuilder {
    pub fn shared(mut self) -> Self {
        self.sharing = SharingMode::Shared;
        self
    }

    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn relay(mut self, relay: Arc<dyn Relay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn build(self, startup: &Startup) -> TestClient {
        let transport = Arc::new(RecordingTransport::default());
        let faults = Arc::new(RecordingFaults::default());
        let handle = Arc::new(ClientHandle::new(
            self.id,
            self.sharing,
            Duration::from_secs(3),
        ));

        let mut params = OutboxParams::new(handle.clone(), transport.clone())
            .with_faults(faults.clone())
            .with_history(self.history)
            .with_delivery(self.delivery);
        if let Some(relay) = self.relay {
            params = params.with_relay(relay);
        }

        TestClient {
            outbox: Outbox::new(params, startup),
            transport,
            faults,
            handle,
        }
    }
}
