//! In-process document store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::store::{Document, DocumentStore, merge_into};
use crate::Result;

/// Document store held in memory, keyed by `(collection, key)`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<(String, String), Document>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a copy of a stored document.
    #[must_use]
    pub fn get(&self, collection: &str, key: &str) -> Option<Document> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored documents across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn set_merge(&self, collection: &str, key: &str, fields: &Document) -> Result<()> {
        let mut documents = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stored = documents
            .entry((collection.to_string(), key.to_string()))
            .or_default();
        merge_into(stored, fields);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessageRecord;
    use proptest::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn second_write_wins_on_collision() {
        let store = MemoryDocumentStore::new();
        let mut first = MessageRecord::new("1").with_body("hi");
        first.read = false;
        let mut second = first.clone();
        second.read = true;

        store
            .set_merge("messages", "1", &first.to_document().unwrap())
            .await
            .unwrap();
        store
            .set_merge("messages", "1", &second.to_document().unwrap())
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let doc = store.get("messages", "1").unwrap();
        assert_eq!(doc["read"], json!(1));
        assert_eq!(doc["body"], json!("hi"));
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let store = MemoryDocumentStore::new();
        let fields = MessageRecord::new("1").to_document().unwrap();
        store.set_merge("a", "1", &fields).await.unwrap();
        store.set_merge("b", "1", &fields).await.unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("c", "1").is_none());
    }

    proptest! {
        #[test]
        fn repeated_upserts_converge_to_union(
            first in proptest::collection::hash_map("[a-e]", 0i64..5, 0..5),
            second in proptest::collection::hash_map("[a-e]", 0i64..5, 0..5),
        ) {
            let to_doc = |m: &std::collections::HashMap<String, i64>| -> Document {
                m.iter().map(|(k, v)| (k.clone(), json!(v))).collect()
            };
            let store = MemoryDocumentStore::new();
            tokio_test::block_on(async {
                store.set_merge("c", "k", &to_doc(&first)).await.unwrap();
                store.set_merge("c", "k", &to_doc(&second)).await.unwrap();
                store.set_merge("c", "k", &to_doc(&second)).await.unwrap();
            });

            let stored = store.get("c", "k").unwrap();
            prop_assert_eq!(store.len(), 1);
            for (k, v) in &second {
                prop_assert_eq!(&stored[k], &json!(v));
            }
            for (k, v) in first.iter().filter(|(k, _)| !second.contains_key(*k)) {
                prop_assert_eq!(&stored[k], &json!(v));
            }
            prop_assert_eq!(
                stored.len(),
                first.keys().chain(second.keys()).collect::<std::collections::HashSet<_>>().len()
            );
        }
    }
}
