//! Raw inbox rows and their conversion into message records.

use std::collections::HashMap;

use crate::message::{MessageId, MessageRecord};

/// Column names of the telephony SMS table.
pub mod columns {
    /// Row identifier.
    pub const ID: &str = "_id";
    /// Sender address.
    pub const ADDRESS: &str = "address";
    /// Message text.
    pub const BODY: &str = "body";
    /// Creating package.
    pub const CREATOR: &str = "creator";
    /// Received timestamp.
    pub const DATE: &str = "date";
    /// Sent timestamp.
    pub const DATE_SENT: &str = "date_sent";
    /// Error code.
    pub const ERROR_CODE: &str = "error_code";
    /// Locked flag.
    pub const LOCKED: &str = "locked";
    /// Message box type.
    pub const TYPE: &str = "type";
    /// Contact reference.
    pub const PERSON: &str = "person";
    /// Protocol identifier.
    pub const PROTOCOL: &str = "protocol";
    /// Read flag.
    pub const READ: &str = "read";
    /// Reply path flag.
    pub const REPLY_PATH_PRESENT: &str = "reply_path_present";
    /// Seen flag.
    pub const SEEN: &str = "seen";
    /// Service center address.
    pub const SERVICE_CENTER: &str = "service_center";
    /// Delivery status.
    pub const STATUS: &str = "status";
    /// Subject line.
    pub const SUBJECT: &str = "subject";
    /// SIM subscription.
    pub const SUBSCRIPTION_ID: &str = "sub_id";
    /// Conversation thread.
    pub const THREAD_ID: &str = "thread_id";

    /// Every column a record is built from.
    pub const ALL: [&str; 19] = [
        ID,
        ADDRESS,
        BODY,
        CREATOR,
        DATE,
        DATE_SENT,
        ERROR_CODE,
        LOCKED,
        TYPE,
        PERSON,
        PROTOCOL,
        READ,
        REPLY_PATH_PRESENT,
        SEEN,
        SERVICE_CENTER,
        STATUS,
        SUBJECT,
        SUBSCRIPTION_ID,
        THREAD_ID,
    ];
}

/// A single cell value as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// SQL NULL.
    Null,
    /// Integer cell.
    Integer(i64),
    /// Floating point cell.
    Real(f64),
    /// Text cell.
    Text(String),
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Option<&str>> for ColumnValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

/// Why a row could not become a [`MessageRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// The provider did not return a required column.
    #[error("column `{0}` not found")]
    MissingColumn(&'static str),

    /// The row has no usable identifier.
    #[error("row has no identifier")]
    MissingId,

    /// A numeric column held a value that is not a number.
    #[error("column `{column}` holds non-numeric value `{value}`")]
    InvalidValue {
        /// Offending column.
        column: &'static str,
        /// Offending value, as text.
        value: String,
    },
}

/// One row of the inbox, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxRow {
    cells: HashMap<String, ColumnValue>,
}

impl InboxRow {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, returning the row for chaining.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<ColumnValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a cell.
    pub fn insert(&mut self, column: &str, value: impl Into<ColumnValue>) {
        self.cells.insert(column.to_string(), value.into());
    }

    /// Look up a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.cells.get(column)
    }

    fn cell(&self, column: &'static str) -> Result<&ColumnValue, RowError> {
        self.get(column).ok_or(RowError::MissingColumn(column))
    }

    /// Read a text column. NULL reads as `None`.
    fn text(&self, column: &'static str) -> Result<Option<String>, RowError> {
        Ok(match self.cell(column)? {
            ColumnValue::Null => None,
            ColumnValue::Integer(n) => Some(n.to_string()),
            ColumnValue::Real(n) => Some(n.to_string()),
            ColumnValue::Text(s) => Some(s.clone()),
        })
    }

    /// Read an integer column. NULL reads as `0`, like the platform cursor.
    fn long(&self, column: &'static str) -> Result<i64, RowError> {
        match self.cell(column)? {
            ColumnValue::Null => Ok(0),
            ColumnValue::Integer(n) => Ok(*n),
            #[allow(clippy::cast_possible_truncation)]
            ColumnValue::Real(n) => Ok(*n as i64),
            ColumnValue::Text(s) => s.trim().parse().map_err(|_| RowError::InvalidValue {
                column,
                value: s.clone(),
            }),
        }
    }

    #[allow(clippy::cast_possible_truncation)] // Provider ints are 32-bit
    fn int(&self, column: &'static str) -> Result<i32, RowError> {
        self.long(column).map(|n| n as i32)
    }

    fn flag(&self, column: &'static str) -> Result<bool, RowError> {
        self.long(column).map(|n| n != 0)
    }
}

impl<S: Into<String>, V: Into<ColumnValue>> FromIterator<(S, V)> for InboxRow {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TryFrom<&InboxRow> for MessageRecord {
    type Error = RowError;

    fn try_from(row: &InboxRow) -> Result<Self, Self::Error> {
        let id = row
            .text(columns::ID)?
            .filter(|id| !id.is_empty())
            .ok_or(RowError::MissingId)?;
        let kind = row.int(columns::TYPE)?;

        Ok(Self {
            id: MessageId(id),
            address: row.text(columns::ADDRESS)?,
            body: row.text(columns::BODY)?,
            creator: row.text(columns::CREATOR)?,
            date: row.long(columns::DATE)?,
            date_sent: row.long(columns::DATE_SENT)?,
            error_code: row.int(columns::ERROR_CODE)?,
            locked: row.flag(columns::LOCKED)?,
            message_type: kind,
            person: row.long(columns::PERSON)?,
            protocol: row.int(columns::PROTOCOL)?,
            read: row.flag(columns::READ)?,
            reply_path_present: row.flag(columns::REPLY_PATH_PRESENT)?,
            seen: row.flag(columns::SEEN)?,
            service_center: row.text(columns::SERVICE_CENTER)?,
            status: row.int(columns::STATUS)?,
            subject: row.text(columns::SUBJECT)?,
            subscription_id: row.long(columns::SUBSCRIPTION_ID)?,
            thread_id: row.long(columns::THREAD_ID)?,
            kind,
        })
    }
}
