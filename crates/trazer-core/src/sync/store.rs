//! Document store abstraction and merge semantics.

use std::future::Future;

use serde_json::{Map, Value};

use crate::Result;

/// A document body: field name to JSON value.
pub type Document = Map<String, Value>;

/// Remote keyed document collection supporting set-with-merge writes.
pub trait DocumentStore: Send + Sync {
    /// Overlay `fields` onto the document `key` in `collection`.
    ///
    /// Fields absent from `fields` keep their stored value, colliding fields
    /// are overwritten, and a missing document is created. Writing the same
    /// fields twice leaves a single document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected or cannot be delivered.
    fn set_merge(
        &self,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Apply set-with-merge semantics to a document held in memory.
///
/// Nested objects are merged field by field; every other value replaces
/// the stored one.
pub fn merge_into(target: &mut Document, fields: &Document) {
    for (name, value) in fields {
        match (target.get_mut(name), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[test]
    fn merge_keeps_absent_and_overwrites_colliding() {
        let mut stored = doc(json!({"id": "1", "read": 0, "note": "kept"}));
        merge_into(&mut stored, &doc(json!({"id": "1", "read": 1})));
        assert_eq!(Value::Object(stored), json!({"id": "1", "read": 1, "note": "kept"}));
    }

    #[test]
    fn merge_recurses_into_objects() {
        let mut stored = doc(json!({"meta": {"a": 1, "b": 2}}));
        merge_into(&mut stored, &doc(json!({"meta": {"b": 3}})));
        assert_eq!(Value::Object(stored), json!({"meta": {"a": 1, "b": 3}}));
    }

    #[test]
    fn null_overwrites() {
        let mut stored = doc(json!({"subject": "x"}));
        merge_into(&mut stored, &doc(json!({"subject": null})));
        assert_eq!(Value::Object(stored), json!({"subject": null}));
    }
}
