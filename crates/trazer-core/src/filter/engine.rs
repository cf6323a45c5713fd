//! Filter evaluation and memoization.

use tracing::trace;

use super::criteria::FilterCriteria;
use crate::message::MessageRecord;

/// Lowercase one character at a time, so a letter folds the same way
/// wherever it appears in a word.
fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Whether a body contains the (already folded) query, ignoring case.
/// A missing body never matches.
fn body_contains(record: &MessageRecord, query_folded: &str) -> bool {
    record
        .body
        .as_deref()
        .is_some_and(|body| fold_case(body).contains(query_folded))
}

/// Whether the address contains the sender filter with exact case.
/// A missing address never matches.
fn address_contains(record: &MessageRecord, sender: &str) -> bool {
    record
        .address
        .as_deref()
        .is_some_and(|address| address.contains(sender))
}

/// Positions of the records that pass the filter, in input order.
///
/// The text query narrows the full sequence first, the sender filter
/// narrows what is left, then the pattern.
#[must_use]
pub fn filter_positions(records: &[MessageRecord], criteria: &FilterCriteria) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..records.len()).collect();

    if !criteria.query.is_empty() {
        let query = fold_case(&criteria.query);
        positions.retain(|&i| body_contains(&records[i], &query));
    }

    if !criteria.sender.is_empty() {
        positions.retain(|&i| address_contains(&records[i], &criteria.sender));
    }

    if let Some(pattern) = &criteria.pattern {
        positions.retain(|&i| {
            records[i]
                .body
                .as_deref()
                .is_some_and(|body| pattern.is_match(body))
        });
    }

    positions
}

/// Records that pass the filter, in input order.
#[must_use]
pub fn apply<'a>(records: &'a [MessageRecord], criteria: &FilterCriteria) -> Vec<&'a MessageRecord> {
    filter_positions(records, criteria)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

/// Memoized filter result for one `(criteria, revision)` pair.
///
/// `revision` identifies the contents of the full sequence; the owner bumps
/// it on every change. Any change to the criteria or the revision forces a
/// recomputation.
#[derive(Debug, Default)]
pub struct FilterCache {
    key: Option<(FilterCriteria, u64)>,
    positions: Vec<usize>,
    computations: u64,
}

impl FilterCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered positions for the given inputs, recomputed only when they
    /// differ from the last call.
    pub fn positions(
        &mut self,
        records: &[MessageRecord],
        revision: u64,
        criteria: &FilterCriteria,
    ) -> &[usize] {
        let fresh = self
            .key
            .as_ref()
            .is_some_and(|(c, r)| *r == revision && c == criteria);

        if !fresh {
            self.positions = filter_positions(records, criteria);
            self.key = Some((criteria.clone(), revision));
            self.computations += 1;
            trace!(
                revision,
                matched = self.positions.len(),
                total = records.len(),
                "Recomputed filtered view"
            );
        }

        &self.positions
    }

    /// Number of times the filter has actually been evaluated.
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }

    /// Drop the memoized result.
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
