//! Message model types.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display format for message timestamps.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stable identifier of an inbox message, used as the remote document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a new message ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One SMS message as retrieved from the device inbox.
///
/// Integer codes (`error_code`, `protocol`, `status`, `message_type`) are
/// passed through from the telephony provider untouched. Flags are held as
/// `bool` and written to documents as `0`/`1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)] // Mirrors the provider's flag columns
pub struct MessageRecord {
    /// Provider row identifier.
    pub id: MessageId,
    /// Originating phone number or sender name.
    pub address: Option<String>,
    /// Message text.
    pub body: Option<String>,
    /// Package name of the app that created the row.
    pub creator: Option<String>,
    /// Received timestamp, epoch milliseconds.
    pub date: i64,
    /// Sent timestamp, epoch milliseconds.
    pub date_sent: i64,
    /// Telephony error code.
    pub error_code: i32,
    /// Whether the message is locked.
    #[serde(with = "int_flag")]
    pub locked: bool,
    /// Message box type (inbox, sent, draft, ...).
    pub message_type: i32,
    /// Contact row reference.
    pub person: i64,
    /// Protocol identifier.
    pub protocol: i32,
    /// Whether the message has been read.
    #[serde(with = "int_flag")]
    pub read: bool,
    /// Whether the reply path is present.
    #[serde(with = "int_flag")]
    pub reply_path_present: bool,
    /// Whether the message has been seen.
    #[serde(with = "int_flag")]
    pub seen: bool,
    /// SMS service center address.
    pub service_center: Option<String>,
    /// Delivery status code.
    pub status: i32,
    /// Subject line, rarely set for SMS.
    pub subject: Option<String>,
    /// SIM subscription the message arrived on.
    pub subscription_id: i64,
    /// Conversation thread.
    pub thread_id: i64,
    /// Message box type as stored under the `type` key.
    #[serde(rename = "type")]
    pub kind: i32,
}

impl MessageRecord {
    /// Create a record with the given id and every other field empty.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(id),
            address: None,
            body: None,
            creator: None,
            date: 0,
            date_sent: 0,
            error_code: 0,
            locked: false,
            message_type: 0,
            person: 0,
            protocol: 0,
            read: false,
            reply_path_present: false,
            seen: false,
            service_center: None,
            status: 0,
            subject: None,
            subscription_id: 0,
            thread_id: 0,
            kind: 0,
        }
    }

    /// Set the sender address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the message body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Convert the record into the field map written to the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_document(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "message serialized to non-object: {other}"
            ))),
        }
    }

    /// Received date in the local time zone, formatted `yyyy-MM-dd HH:mm:ss`.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.formatted_date_in(&Local)
    }

    /// Received date formatted in the given time zone.
    #[must_use]
    pub fn formatted_date_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        tz.timestamp_millis_opt(self.date)
            .single()
            .map_or_else(String::new, |dt| dt.format(DATE_FORMAT).to_string())
    }

    /// Label/value pairs for the expanded message view.
    #[must_use]
    pub fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Type", self.kind.to_string()),
            ("Thread ID", self.thread_id.to_string()),
            ("Error Code", self.error_code.to_string()),
            ("Locked", yes_no(self.locked)),
            ("Protocol", self.protocol.to_string()),
            ("Read", yes_no(self.read)),
            ("Reply Path Present", yes_no(self.reply_path_present)),
            ("Seen", yes_no(self.seen)),
            (
                "Service Center",
                self.service_center.clone().unwrap_or_default(),
            ),
            ("Status", self.status.to_string()),
            (
                "Subject",
                self.subject
                    .clone()
                    .unwrap_or_else(|| "No subject".to_string()),
            ),
            ("Subscription ID", self.subscription_id.to_string()),
        ]
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

/// Serde helpers for flags stored as `0`/`1` integers.
mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(i32::from(*flag))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Int(i64),
            Bool(bool),
        }

        Ok(match Flag::deserialize(deserializer)? {
            Flag::Int(n) => n != 0,
            Flag::Bool(b) => b,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn message_id_display() {
        let id = MessageId::new("42");
        assert_eq!(format!("{id}"), "42");
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn document_uses_camel_case_and_int_flags() {
        let mut record = MessageRecord::new("7").with_address("555").with_body("hi");
        record.read = true;
        record.kind = 1;
        record.message_type = 1;
        record.date_sent = 1_700_000_000_000;

        let doc = record.to_document().unwrap();
        assert_eq!(doc["id"], json!("7"));
        assert_eq!(doc["read"], json!(1));
        assert_eq!(doc["seen"], json!(0));
        assert_eq!(doc["type"], json!(1));
        assert_eq!(doc["messageType"], json!(1));
        assert_eq!(doc["dateSent"], json!(1_700_000_000_000_i64));
        assert_eq!(doc["replyPathPresent"], json!(0));
        assert_eq!(doc["subject"], Value::Null);
        assert!(!doc.contains_key("kind"));
    }

    #[test]
    fn document_round_trips_through_serde() {
        let mut record = MessageRecord::new("9").with_body("body");
        record.locked = true;
        let value = Value::Object(record.to_document().unwrap());
        let back: MessageRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn flags_accept_booleans() {
        let mut doc = MessageRecord::new("1").to_document().unwrap();
        doc.insert("seen".to_string(), json!(true));
        let record: MessageRecord = serde_json::from_value(Value::Object(doc)).unwrap();
        assert!(record.seen);
    }

    #[test]
    fn formatted_date_in_utc() {
        let mut record = MessageRecord::new("1");
        record.date = 1_704_067_200_000; // 2024-01-01T00:00:00Z
        assert_eq!(record.formatted_date_in(&Utc), "2024-01-01 00:00:00");
    }

    #[test]
    fn details_render_flags_and_missing_subject() {
        let mut record = MessageRecord::new("1");
        record.read = true;
        let details = record.details();
        let get = |label: &str| {
            details
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("Read"), "Yes");
        assert_eq!(get("Locked"), "No");
        assert_eq!(get("Subject"), "No subject");
        assert_eq!(get("Service Center"), "");
    }
}
