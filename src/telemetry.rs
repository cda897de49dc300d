//! Telemetry for the delivery loop: history append latency and replay sizes.
//!
//! The loop reports through [`DeliveryTelemetry`] so tests can observe or
//! ignore it. [`HistoryStats`] is the production implementation.

use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

/// Log the history length every this many entries.
const HISTORY_LOG_INTERVAL: usize = 1000;

/// Side interface the outbox reports timings to.
pub trait DeliveryTelemetry: Send + Sync {
    /// One history append took `elapsed`; the log now holds `history_len`.
    fn record_append(&self, client_id: &str, elapsed: Duration, history_len: usize);

    /// A resync replayed `replayed` messages, collected in `elapsed`.
    fn record_replay(&self, client_id: &str, replayed: usize, elapsed: Duration);
}

/// Minimum, maximum and running average of append latency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendStats {
    pub count: u64,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Duration,
}

impl AppendStats {
    pub fn observe(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |min| min.min(elapsed)));
        self.max = self.max.max(elapsed);
    }

    pub fn average(&self) -> Option<Duration> {
        let count = u32::try_from(self.count).ok().filter(|c| *c > 0)?;
        Some(self.total / count)
    }
}

/// Tracks append statistics and exports them to tracing and Prometheus.
#[derive(Debug, Default)]
pub struct HistoryStats {
    appends: Mutex<AppendStats>,
}

impl HistoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AppendStats {
        *self.appends.lock()
    }
}

impl DeliveryTelemetry for HistoryStats {
    fn record_append(&self, client_id: &str, elapsed: Duration, history_len: usize) {
        self.appends.lock().observe(elapsed);
        crate::metrics::record_history_append(elapsed.as_secs_f64(), history_len);

        if history_len > 0 && history_len % HISTORY_LOG_INTERVAL == 0 {
            debug!(client = %client_id, history_len, "History size checkpoint");
        }
    }

    fn record_replay(&self, client_id: &str, replayed: usize, elapsed: Duration) {
        let stats = self.snapshot();
        crate::metrics::record_replay(replayed);
        debug!(
            client = %client_id,
            replayed,
            collect_us = elapsed.as_micros() as u64,
            append_avg_us = stats.average().map(|d| d.as_micros() as u64),
            append_min_us = stats.min.map(|d| d.as_micros() as u64),
            append_max_us = stats.max.as_micros() as u64,
            "Collected replay batch"
        );
    }
}

/// Standardized span constructors for outbox observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one connection's delivery loop.
    pub fn outbox(client_id: &str) -> Span {
        info_span!("outbox", client = %client_id)
    }

    /// Create a span for a resync request.
    pub fn resync(client_id: &str, last_message_id: u64) -> Span {
        info_span!("resync", client = %client_id, last_message_id)
    }
}
