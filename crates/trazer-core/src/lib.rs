//! # trazer-core
//!
//! Core logic for the `Trazer` SMS reader.
//!
//! This crate provides:
//! - **Source Reader** - normalized message records from a device inbox
//! - **Filter Engine** - text query, sender and pattern filtering
//! - **Remote Sync** - idempotent set-with-merge upserts through an outbox
//! - **Message Session** - single-writer state with observable filtered views
//! - Settings persistence and the sign-in session gate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
mod error;
pub mod filter;
pub mod inbox;
pub mod message;
pub mod overview;
pub mod session;
pub mod settings;
pub mod sync;

pub use auth::{AuthSession, AuthState, IdentityProvider, IdentityToolkitProvider, User};
pub use error::{Error, Result};
pub use filter::{FilterCache, FilterCriteria};
pub use inbox::{
    InboxProvider, InboxRow, PermissionGate, PermissionStatus, ReadSummary, RowError, SkippedRow,
    SqliteInbox, read_inbox,
};
pub use message::{MessageId, MessageRecord};
pub use overview::{SenderShare, sender_breakdown};
pub use session::{FilteredView, MessageSession, MessageState, SessionHandle, load_inbox};
pub use settings::{AppSettings, RemoteConfig, SettingsError, SettingsStore};
pub use sync::{
    DocumentStore, FirestoreStore, MemoryDocumentStore, RetryPolicy, SqliteDocumentStore,
    SyncEvent, SyncOutbox, SyncStats,
};
