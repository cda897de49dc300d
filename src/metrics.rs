//! Prometheus metrics collection for the delivery outbox.
//!
//! ## Metrics
//!
//! - `outbox_messages_sent_total` - Messages handed to the transport
//! - `outbox_send_failures_total` - Per-message send failures
//! - `outbox_faults_total{kind}` - Faults routed to the fault handler
//! - `outbox_resync_requests_total{outcome}` - Reconnect resyncs by outcome
//! - `outbox_replayed_messages` - Messages per replay batch (histogram)
//! - `outbox_history_append_seconds` - History append latency (histogram)
//! - `outbox_history_length` - Length of the most recently appended log

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Total messages successfully sent to clients.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Total messages the transport failed to send.
pub static SEND_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Faults by kind (send, relay, serialize).
pub static FAULTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Resync requests by outcome (replayed, gap).
pub static RESYNC_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms and gauges
// ========================================================================

pub static REPLAYED_MESSAGES: OnceLock<Histogram> = OnceLock::new();

pub static HISTORY_APPEND_LATENCY: OnceLock<Histogram> = OnceLock::new();

pub static HISTORY_LENGTH: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Recording before
/// `init` is a no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(MESSAGES_SENT, IntCounter::new("outbox_messages_sent_total", "Messages handed to the transport"));
    register!(SEND_FAILURES, IntCounter::new("outbox_send_failures_total", "Per-message send failures"));
    register!(FAULTS, IntCounterVec::new(Opts::new("outbox_faults_total", "Faults routed to the fault handler"), &["kind"]));
    register!(RESYNC_REQUESTS, IntCounterVec::new(Opts::new("outbox_resync_requests_total", "Reconnect resync requests by outcome"), &["outcome"]));
    register!(REPLAYED_MESSAGES, Histogram::with_opts(
        HistogramOpts::new("outbox_replayed_messages", "Messages per replay batch")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0])));
    register!(HISTORY_APPEND_LATENCY, Histogram::with_opts(
        HistogramOpts::new("outbox_history_append_seconds", "History append latency")
            .buckets(vec![0.000001, 0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001])));
    register!(HISTORY_LENGTH, IntGauge::new("outbox_history_length", "Entries in the most recently appended history log"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for outbox metric updates
// ============================================================================

/// Record a message handed to the transport.
#[inline]
pub fn record_sent() {
    if let Some(c) = MESSAGES_SENT.get() {
        c.inc();
    }
}

/// Record a failed send.
#[inline]
pub fn record_send_failure() {
    if let Some(c) = SEND_FAILURES.get() {
        c.inc();
    }
}

/// Record a fault by its error code.
#[inline]
pub fn record_fault(kind: &str) {
    if let Some(c) = FAULTS.get() {
        c.with_label_values(&[kind]).inc();
    }
}

/// Record the outcome of a resync request.
#[inline]
pub fn record_resync(outcome: &str) {
    if let Some(c) = RESYNC_REQUESTS.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

/// Record the size of a replay batch.
#[inline]
pub fn record_replay(messages: usize) {
    if let Some(h) = REPLAYED_MESSAGES.get() {
        h.observe(messages as f64);
    }
}

/// Record one history append.
#[inline]
pub fn record_history_append(duration_secs: f64, history_len: usize) {
    if let Some(h) = HISTORY_APPEND_LATENCY.get() {
        h.observe(duration_secs);
    }
    if let Some(g) = HISTORY_LENGTH.get() {
        g.set(i64::try_from(history_len).unwrap_or(i64::MAX));
    }
}
