//! # resync-proto
//!
//! Wire types exchanged between a delivery outbox and its remote client.
//!
//! ## Overview
//!
//! Every history-eligible message carries a `message_id` field inside its
//! payload object. A reconnecting client reports the last id it applied in a
//! [`SyncRequest`]; the server answers with a [`SyncResponse`] sent under the
//! [`SYNCHRONIZE`] message type, which is never numbered itself.
//!
//! ```rust
//! use resync_proto::{SequenceTracker, SyncRequest};
//!
//! let mut tracker = SequenceTracker::new(0);
//! tracker.observe(1).unwrap();
//! tracker.observe(2).unwrap();
//! assert!(tracker.observe(4).is_err());
//!
//! let request = SyncRequest::new(tracker.last_message_id(), "r1");
//! assert_eq!(request.last_message_id, 2);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod message;
pub mod sequence;
pub mod sync;

pub use message::{
    ClientId, ElementId, MESSAGE_ID_FIELD, Payload, SYNCHRONIZE, UPDATE, stamp_message_id,
    take_message_id,
};
pub use sequence::{SequenceError, SequenceTracker};
pub use sync::{ReplayedMessage, SyncRequest, SyncResponse};
