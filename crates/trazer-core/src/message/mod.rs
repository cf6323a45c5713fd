//! SMS message records.
//!
//! A [`MessageRecord`] is one row of the device inbox, normalized and
//! immutable. Records are only ever produced by the inbox reader.

mod model;

pub use model::{MessageId, MessageRecord};
