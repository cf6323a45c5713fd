//! Per-sender statistics for the overview screen.

use std::collections::HashMap;

use crate::message::MessageRecord;

/// Label used for records without a sender address.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Share of the inbox sent by one address.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderShare {
    /// Sender address.
    pub sender: String,
    /// Number of records from this sender.
    pub count: usize,
    /// Percentage of all records, `0.0..=100.0`.
    pub percent: f64,
}

/// Count records per sender, largest first.
///
/// Ties are ordered by sender so the output is stable.
#[must_use]
pub fn sender_breakdown(records: &[MessageRecord]) -> Vec<SenderShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let sender = record
            .address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_SENDER);
        *counts.entry(sender).or_default() += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = records.len() as f64;
    let mut shares: Vec<SenderShare> = counts
        .into_iter()
        .map(|(sender, count)| {
            #[allow(clippy::cast_precision_loss)]
            let percent = count as f64 * 100.0 / total;
            SenderShare {
                sender: sender.to_string(),
                count,
                percent,
            }
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sender.cmp(&b.sender)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(address: Option<&str>) -> MessageRecord {
        let record = MessageRecord::new("x");
        match address {
            Some(a) => record.with_address(a),
            None => record,
        }
    }

    #[test]
    fn empty_inbox_has_no_shares() {
        assert!(sender_breakdown(&[]).is_empty());
    }

    #[test]
    fn shares_are_sorted_and_sum_to_100() {
        let records = [
            from(Some("BANK")),
            from(Some("555")),
            from(Some("BANK")),
            from(None),
        ];
        let shares = sender_breakdown(&records);

        let senders: Vec<_> = shares.iter().map(|s| s.sender.as_str()).collect();
        assert_eq!(senders, ["BANK", "555", UNKNOWN_SENDER]);
        assert_eq!(shares[0].count, 2);
        assert!((shares[0].percent - 50.0).abs() < f64::EPSILON);

        let sum: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_address_counts_as_unknown() {
        let shares = sender_breakdown(&[from(Some("")), from(None)]);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].sender, UNKNOWN_SENDER);
        assert_eq!(shares[0].count, 2);
    }
}
