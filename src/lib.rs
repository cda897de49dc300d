//! resync-outbox - per-connection delivery outbox.
//!
//! Queues element updates and point-to-point messages for one client
//! connection, delivers them in coalesced batches from a background task,
//! and keeps a bounded, sequenced history so a client that reconnects can be
//! replayed what it missed instead of reloading.
//!
//! ```no_run
//! use std::sync::Arc;
//! use resync_outbox::{Outbox, OutboxParams, Startup};
//! # fn wire(connection: Arc<dyn resync_outbox::Connection>, transport: Arc<dyn resync_outbox::Transport>) {
//! let startup = Startup::running();
//! let outbox = Outbox::new(OutboxParams::new(connection, transport), &startup);
//! outbox.enqueue_message("notify", serde_json::json!({"text": "hi"}), "client-1").ok();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fault;
pub mod history;
pub mod http;
pub mod metrics;
pub mod outbox;
pub mod registry;
pub mod runtime;
pub mod telemetry;
pub mod transport;

pub use config::Config;
pub use error::{DeliveryError, OutboxError, TransportError};
pub use fault::{FaultHandler, TracingFaultHandler};
pub use history::{HistoryLog, HistoryStore, MemoryHistory, NoOpHistory, ResyncGap, RetentionPolicy};
pub use outbox::{Outbox, OutboxParams};
pub use registry::OutboxRegistry;
pub use runtime::Startup;
pub use telemetry::{DeliveryTelemetry, HistoryStats};
pub use transport::{
    ClientHandle, Connection, Element, Relay, SharingMode, Transport, TransportTimeouts,
};
