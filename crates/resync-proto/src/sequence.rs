//! Client-side message id validation.
//!
//! A client applies numbered messages strictly in order. Anything at or
//! below the last applied id is a duplicate; anything beyond `last + 1`
//! means messages were lost and the client has to resynchronize.

use thiserror::Error;

/// Why an incoming message id was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The id was already applied.
    #[error("redundant message {received} (last applied {last})")]
    Duplicate {
        /// Incoming id.
        received: u64,
        /// Last applied id.
        last: u64,
    },
    /// One or more ids between `last` and `received` were never seen.
    #[error("gap detected: received {received}, last applied {last}")]
    Gap {
        /// Incoming id.
        received: u64,
        /// Last applied id.
        last: u64,
    },
}

/// Tracks the last applied message id of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTracker {
    last: u64,
}

impl SequenceTracker {
    /// Start from the id the client was seeded with at page load.
    pub fn new(starting_message_id: u64) -> Self {
        Self {
            last: starting_message_id,
        }
    }

    /// Last applied message id.
    pub fn last_message_id(&self) -> u64 {
        self.last
    }

    /// Accept `id` if it is exactly the next one.
    pub fn observe(&mut self, id: u64) -> Result<(), SequenceError> {
        if id <= self.last {
            return Err(SequenceError::Duplicate {
                received: id,
                last: self.last,
            });
        }
        if id != self.last + 1 {
            return Err(SequenceError::Gap {
                received: id,
                last: self.last,
            });
        }
        self.last = id;
        Ok(())
    }
}
