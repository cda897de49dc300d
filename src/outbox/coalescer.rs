//! Last-write-wins coalescing of element updates.

use resync_proto::{ElementId, Payload};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DeliveryError;
use crate::transport::Element;

/// Pending state of one element.
#[derive(Clone)]
pub enum PendingUpdate {
    /// Send the element's state as of the drain.
    Update(Arc<dyn Element>),
    /// Tell the client to drop the element.
    Delete,
}

/// At most one pending entry per element; a later write replaces the earlier
/// one entirely.
#[derive(Default)]
pub struct UpdateCoalescer {
    pending: HashMap<ElementId, PendingUpdate>,
}

impl UpdateCoalescer {
    pub fn update(&mut self, element: Arc<dyn Element>) {
        self.pending.insert(element.id(), PendingUpdate::Update(element));
    }

    pub fn delete(&mut self, element_id: ElementId) {
        self.pending.insert(element_id, PendingUpdate::Delete);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Combined `update` payload mapping each element id to its serialized
    /// state, or `null` for a deletion. `None` when nothing is pending.
    pub fn build_payload(&self) -> Result<Option<Payload>, DeliveryError> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let mut map = Map::with_capacity(self.pending.len());
        for (element_id, update) in &self.pending {
            let value = match update {
                PendingUpdate::Update(element) => {
                    element
                        .to_payload()
                        .map_err(|source| DeliveryError::Serialize {
                            element_id: *element_id,
                            source,
                        })?
                }
                PendingUpdate::Delete => Value::Null,
            };
            map.insert(element_id.to_string(), value);
        }
        Ok(Some(Value::Object(map)))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Label {
        id: ElementId,
        state: Value,
    }

    impl Element for Label {
        fn id(&self) -> ElementId {
            self.id
        }

        fn to_payload(&self) -> Result<Payload, serde_json::Error> {
            Ok(self.state.clone())
        }
    }

    struct Broken;

    impl Element for Broken {
        fn id(&self) -> ElementId {
            99
        }

        fn to_payload(&self) -> Result<Payload, serde_json::Error> {
            serde_json::from_str("{")
        }
    }

    fn label(id: ElementId, state: Value) -> Arc<dyn Element> {
        Arc::new(Label { id, state })
    }

    #[test]
    fn empty_coalescer_builds_nothing() {
        let coalescer = UpdateCoalescer::default();
        assert!(coalescer.build_payload().unwrap().is_none());
    }

    #[test]
    fn last_update_wins() {
        let mut coalescer = UpdateCoalescer::default();
        coalescer.update(label(7, json!({"x": 1})));
        coalescer.update(label(7, json!({"x": 2})));

        assert_eq!(coalescer.len(), 1);
        assert_eq!(coalescer.build_payload().unwrap(), Some(json!({"7": {"x": 2}})));
    }

    #[test]
    fn delete_replaces_pending_update() {
        let mut coalescer = UpdateCoalescer::default();
        coalescer.update(label(7, json!({"x": 2})));
        coalescer.delete(7);

        assert_eq!(coalescer.build_payload().unwrap(), Some(json!({"7": null})));
    }

    #[test]
    fn update_after_delete_resurrects() {
        let mut coalescer = UpdateCoalescer::default();
        coalescer.delete(3);
        coalescer.update(label(3, json!({"text": "back"})));

        assert_eq!(
            coalescer.build_payload().unwrap(),
            Some(json!({"3": {"text": "back"}}))
        );
    }

    #[test]
    fn distinct_elements_are_all_kept() {
        let mut coalescer = UpdateCoalescer::default();
        coalescer.update(label(1, json!("a")));
        coalescer.update(label(2, json!("b")));
        coalescer.delete(3);

        assert_eq!(
            coalescer.build_payload().unwrap(),
            Some(json!({"1": "a", "2": "b", "3": null}))
        );
    }

    #[test]
    fn serialization_failure_names_the_element() {
        let mut coalescer = UpdateCoalescer::default();
        coalescer.update(Arc::new(Broken));

        let err = coalescer.build_payload().unwrap_err();
        assert!(matches!(err, DeliveryError::Serialize { element_id: 99, .. }));
        assert_eq!(coalescer.len(), 1);
    }
}
