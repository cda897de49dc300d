//! In-memory history store.

use std::collections::VecDeque;

use super::{HistoryEntry, HistoryStore};
use resync_proto::ReplayedMessage;
use tokio::time::Instant;

/// Deque-backed store; history is lost with the process.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: VecDeque<HistoryEntry>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, entry: HistoryEntry) {
        debug_assert!(
            self.entries
                .back()
                .is_none_or(|last| last.seq + 1 == entry.seq),
            "history sequence ids must be consecutive"
        );
        self.entries.push_back(entry);
    }

    fn evict(&mut self, cutoff: Option<Instant>, max_len: usize) -> usize {
        let mut evicted = 0;
        while let Some(oldest) = self.entries.front() {
            let stale = cutoff.is_some_and(|cutoff| oldest.timestamp < cutoff);
            if !stale && self.entries.len() < max_len {
                break;
            }
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    fn range_from(&self, next_id: u64) -> Vec<ReplayedMessage> {
        let Some(oldest) = self.oldest_id() else {
            return vec![];
        };
        let start = usize::try_from(next_id.saturating_sub(oldest)).unwrap_or(usize::MAX);
        self.entries
            .iter()
            .skip(start)
            .map(|entry| entry.message.clone())
            .collect()
    }

    fn oldest_id(&self) -> Option<u64> {
        self.entries.front().map(|entry| entry.seq)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
