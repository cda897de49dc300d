//! No-op history store that discards all messages.
//!
//! Used when history is disabled. Sequence ids keep advancing in the
//! [`HistoryLog`](super::HistoryLog), but nothing can be replayed.

use super::{HistoryEntry, HistoryStore};
use resync_proto::ReplayedMessage;
use tokio::time::Instant;

pub struct NoOpHistory;

impl HistoryStore for NoOpHistory {
    fn append(&mut self, _entry: HistoryEntry) {}

    fn evict(&mut self, _cutoff: Option<Instant>, _max_len: usize) -> usize {
        0
    }

    fn range_from(&self, _next_id: u64) -> Vec<ReplayedMessage> {
        vec![]
    }

    fn oldest_id(&self) -> Option<u64> {
        None
    }

    fn len(&self) -> usize {
        0
    }
}
