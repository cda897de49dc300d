//! Integration test common infrastructure.
//!
//! Provides a recording transport, scripted elements and a harness that
//! wires an outbox to them.

pub mod harness;
pub mod transport;

#[allow(unused_imports)]
pub use harness::{TestClient, TestElement};
#[allow(unused_imports)]
pub use transport::{RecordingFaults, RecordingRelay, RecordingTransport, Sent};
