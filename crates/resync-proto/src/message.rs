//! Message type names, identifiers and payload stamping.

use serde_json::Value;

/// Identifier of a connected client (also the room its messages go to).
pub type ClientId = String;

/// Identifier of a renderable element whose updates coalesce.
pub type ElementId = u64;

/// Opaque message payload.
pub type Payload = Value;

/// Message type of the combined per-cycle element update.
pub const UPDATE: &str = "update";

/// Message type of the resync response. Never recorded in history.
pub const SYNCHRONIZE: &str = "synchronize";

/// Payload field carrying the sequence id of a history-eligible message.
pub const MESSAGE_ID_FIELD: &str = "message_id";

/// Write `message_id` into an object payload.
///
/// Returns `false` (and leaves the payload untouched) for non-object payloads,
/// which have nowhere to carry the id.
pub fn stamp_message_id(payload: &mut Payload, message_id: u64) -> bool {
    match payload.as_object_mut() {
        Some(map) => {
            map.insert(MESSAGE_ID_FIELD.to_string(), Value::from(message_id));
            true
        }
        None => false,
    }
}

/// Remove and return the `message_id` of a received payload.
pub fn take_message_id(payload: &mut Payload) -> Option<u64> {
    payload
        .as_object_mut()
        .and_then(|map| map.remove(MESSAGE_ID_FIELD))
        .and_then(|id| id.as_u64())
}
