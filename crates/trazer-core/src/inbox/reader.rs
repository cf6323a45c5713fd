//! Inbox providers and the record reader.

use std::future::Future;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use super::permission::{PermissionGate, PermissionStatus};
use super::row::{ColumnValue, InboxRow, RowError};
use crate::Result;
use crate::message::MessageRecord;

/// Tabular source of inbox rows.
///
/// Rows come back in the provider's default sort order; the reader keeps
/// that order as is.
pub trait InboxProvider {
    /// Query every inbox row.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be queried.
    fn query_inbox(&self) -> impl Future<Output = Result<Vec<InboxRow>>> + Send;
}

/// A row the reader could not turn into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based position of the row in the provider result.
    pub position: usize,
    /// Why the row was skipped.
    pub reason: RowError,
}

/// Outcome of one inbox read.
#[derive(Debug, Clone, Default)]
pub struct ReadSummary {
    /// Permission state observed at read time.
    pub permission: PermissionStatus,
    /// Parsed records in provider order.
    pub records: Vec<MessageRecord>,
    /// Rows that were dropped.
    pub skipped: Vec<SkippedRow>,
}

impl ReadSummary {
    /// Summary of a read that was refused for lack of permission.
    #[must_use]
    pub fn not_permitted(permission: PermissionStatus) -> Self {
        Self {
            permission,
            ..Self::default()
        }
    }

    /// Number of rows skipped as malformed.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Whether the empty result is due to missing permission rather than an
    /// empty inbox.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        !self.permission.is_granted()
    }
}

/// Read the inbox into normalized records.
///
/// Without permission the result is empty and carries the observed
/// [`PermissionStatus`]. Malformed rows are skipped and listed in the
/// summary.
///
/// # Errors
///
/// Returns an error only if the provider itself fails.
pub async fn read_inbox<P, G>(provider: &P, gate: &G) -> Result<ReadSummary>
where
    P: InboxProvider + ?Sized,
    G: PermissionGate + ?Sized,
{
    let permission = gate.status();
    if !permission.is_granted() {
        info!(?permission, "SMS permission not granted, skipping inbox read");
        return Ok(ReadSummary::not_permitted(permission));
    }

    let rows = provider.query_inbox().await?;
    let mut summary = ReadSummary {
        permission,
        records: Vec::with_capacity(rows.len()),
        skipped: Vec::new(),
    };

    for (position, row) in rows.iter().enumerate() {
        match MessageRecord::try_from(row) {
            Ok(record) => summary.records.push(record),
            Err(reason) => {
                debug!(position, %reason, "Skipping malformed inbox row");
                summary.skipped.push(SkippedRow { position, reason });
            }
        }
    }

    if summary.skipped.is_empty() {
        info!(records = summary.records.len(), "Read inbox");
    } else {
        warn!(
            records = summary.records.len(),
            skipped = summary.skipped.len(),
            "Read inbox with malformed rows"
        );
    }
    Ok(summary)
}

/// Inbox provider backed by an Android-style `mmssms.db` database.
///
/// Reads the `sms` table restricted to inbox rows, newest first.
pub struct SqliteInbox {
    pool: SqlitePool,
}

impl SqliteInbox {
    /// Message box type of received messages.
    pub const INBOX_TYPE: i64 = 1;

    /// Open a message database read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn open(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=ro");
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await?;
        debug!("Opened inbox database {database_path}");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl InboxProvider for SqliteInbox {
    async fn query_inbox(&self) -> Result<Vec<InboxRow>> {
        let rows = sqlx::query(
            r"
            SELECT *
            FROM sms
            WHERE type = ?
            ORDER BY date DESC
            ",
        )
        .bind(Self::INBOX_TYPE)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_row).collect()
    }
}

/// Convert a database row into a column map, keeping the cell types.
fn decode_row(row: &SqliteRow) -> Result<InboxRow> {
    let mut inbox_row = InboxRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            ColumnValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => ColumnValue::Integer(row.try_get(index)?),
                "REAL" => ColumnValue::Real(row.try_get(index)?),
                "TEXT" => ColumnValue::Text(row.try_get(index)?),
                other => {
                    debug!(column = column.name(), other, "Ignoring unsupported cell type");
                    ColumnValue::Null
                }
            }
        };
        inbox_row.insert(column.name(), value);
    }
    Ok(inbox_row)
}
