//! Source reader for the device SMS inbox.
//!
//! The inbox is reached through an [`InboxProvider`], a tabular source of
//! rows keyed by the telephony column names. [`read_inbox`] checks the
//! [`PermissionGate`] and turns each row into a
//! [`MessageRecord`](crate::MessageRecord), skipping rows that do not parse.
//!
//! # Example
//!
//! ```ignore
//! use trazer_core::inbox::{SqliteInbox, PermissionStatus, read_inbox};
//!
//! let inbox = SqliteInbox::open("/data/mmssms.db").await?;
//! let summary = read_inbox(&inbox, &PermissionStatus::Granted).await?;
//!
//! if summary.is_permission_denied() {
//!     // ask for access and retry
//! }
//! for record in &summary.records {
//!     println!("{}: {:?}", record.id, record.body);
//! }
//! ```

mod permission;
mod reader;
mod row;

pub use permission::{PermissionGate, PermissionStatus};
pub use reader::{InboxProvider, ReadSummary, SkippedRow, SqliteInbox, read_inbox};
pub use row::{ColumnValue, InboxRow, RowError, columns};

#[cfg(test)]
pub(crate) use reader::tests::FixedInbox;
#[cfg(test)]
pub(crate) use row::tests::full_row;
