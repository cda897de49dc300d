//! Level-triggered wake signal between producers and the delivery loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// "There is pending work" flag.
///
/// Producers [`set`](WakeSignal::set) it after queuing; the loop
/// [`clear`](WakeSignal::clear)s it right before snapshotting the queues, so a
/// set racing with a drain is seen by the next cycle.
#[derive(Debug, Default)]
pub struct WakeSignal {
    flag: AtomicBool,
    notify: Notify,
}

impl WakeSignal {
    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Wake a waiting loop without signalling work.
    pub fn interrupt(&self) {
        self.notify.notify_waiters();
    }

    /// Wait until the signal is set, interrupted, or `timeout` passes.
    /// Returns whether the signal is set.
    pub async fn wait(&self, timeout: Duration) -> bool {
        if self.is_set() {
            return true;
        }

        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before re-checking so a set in between is not missed
        notified.as_mut().enable();
        if self.is_set() {
            return true;
        }

        let _ = tokio::time::timeout(timeout, notified).await;
        self.is_set()
    }
}
