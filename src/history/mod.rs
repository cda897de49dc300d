//! History log abstraction.
//!
//! Every history-eligible message an outbox sends is recorded here under a
//! sequence id so a reconnecting client can be replayed what it missed.
//! Storage sits behind [`HistoryStore`]; the sequencing, retention and gap
//! rules live in [`HistoryLog`] and hold for any store.

use resync_proto::{ClientId, Payload, ReplayedMessage};
use std::sync::OnceLock;
use tokio::time::Instant;

pub mod memory;
pub mod noop;
pub mod retention;
pub mod types;

pub use memory::MemoryHistory;
pub use noop::NoOpHistory;
pub use retention::RetentionPolicy;
pub use types::{HistoryEntry, ResyncGap};

/// Ordered storage of sent messages.
///
/// Entries are appended with consecutive sequence ids and only ever removed
/// from the front.
pub trait HistoryStore: Send {
    /// Append an entry. Its sequence id follows the previous one.
    fn append(&mut self, entry: HistoryEntry);

    /// Evict from the front while the oldest entry is older than `cutoff` or
    /// the store holds `max_len` entries or more. Returns the number evicted.
    fn evict(&mut self, cutoff: Option<Instant>, max_len: usize) -> usize;

    /// Messages with sequence id `>= next_id`, oldest first.
    fn range_from(&self, next_id: u64) -> Vec<ReplayedMessage>;

    /// Sequence id of the oldest retained entry.
    fn oldest_id(&self) -> Option<u64>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequenced, bounded history of one connection.
pub struct HistoryLog {
    store: Box<dyn HistoryStore>,
    message_count: u64,
    retention: OnceLock<RetentionPolicy>,
}

impl HistoryLog {
    pub fn new(store: Box<dyn HistoryStore>) -> Self {
        Self {
            store,
            message_count: 0,
            retention: OnceLock::new(),
        }
    }

    /// Total history-eligible messages recorded so far.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Retention in effect, once resolved by the first record.
    pub fn retention(&self) -> Option<&RetentionPolicy> {
        self.retention.get()
    }

    /// Record a sent message and return its sequence id.
    ///
    /// `resolve` runs on the first call only. `payload` should already carry
    /// the returned id; use [`HistoryLog::next_id`] to stamp it beforehand.
    pub fn record(
        &mut self,
        message_type: &str,
        payload: Payload,
        target: &str,
        now: Instant,
        resolve: impl FnOnce() -> RetentionPolicy,
    ) -> u64 {
        let retention = *self.retention.get_or_init(resolve);

        let cutoff = now.checked_sub(retention.window);
        self.store.evict(cutoff, retention.max_length);

        self.message_count += 1;
        self.store.append(HistoryEntry {
            seq: self.message_count,
            timestamp: now,
            message: ReplayedMessage(message_type.to_string(), payload, ClientId::from(target)),
        });
        self.message_count
    }

    /// Sequence id the next recorded message will get.
    pub fn next_id(&self) -> u64 {
        self.message_count + 1
    }

    /// Messages a client that last applied `last_message_id` has missed.
    pub fn replay(&self, last_message_id: u64) -> Result<Vec<ReplayedMessage>, ResyncGap> {
        // A client claiming the largest id is simply ahead of the log
        let next_id = last_message_id.saturating_add(1);
        match self.store.oldest_id() {
            Some(oldest_id) if oldest_id > next_id => Err(ResyncGap {
                requested: next_id,
                oldest_retained: Some(oldest_id),
                message_count: self.message_count,
            }),
            Some(_) => Ok(self.store.range_from(next_id)),
            None if last_message_id == self.message_count => Ok(Vec::new()),
            None => Err(ResyncGap {
                requested: next_id,
                oldest_retained: None,
                message_count: self.message_count,
            }),
        }
    }
}
