//! Remote sync of message records.
//!
//! Records are upserted into a keyed document collection with
//! set-with-merge semantics: fields present in the record overwrite,
//! fields absent from it survive. Syncing the same record twice converges
//! to one document, so duplicate inbox reads are harmless.
//!
//! Writes go through a [`SyncOutbox`], which never blocks the caller and
//! retries failures in the background.

mod firestore;
mod memory;
mod outbox;
mod sqlite;
mod store;

pub use firestore::{FIRESTORE_ENDPOINT, FirestoreStore, encode_fields};
pub use memory::MemoryDocumentStore;
pub use outbox::{DEFAULT_COLLECTION, OutboxSender, RetryPolicy, SyncEvent, SyncOutbox, SyncStats};
pub use sqlite::SqliteDocumentStore;
pub use store::{Document, DocumentStore, merge_into};
