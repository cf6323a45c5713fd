//! Single-writer message state.

use regex::Regex;

use crate::filter::{FilterCache, FilterCriteria};
use crate::message::MessageRecord;

/// Snapshot of the filtered list handed to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    /// Records passing the criteria, in source order.
    pub records: Vec<MessageRecord>,
    /// Size of the full sequence the view was derived from.
    pub total: usize,
    /// Criteria the view was computed with.
    pub criteria: FilterCriteria,
    /// Revision of the full sequence.
    pub revision: u64,
}

impl FilteredView {
    /// Number of records in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record passed the criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Full record sequence together with the current filter inputs.
///
/// Owned by exactly one writer. The revision counter is bumped on every
/// append, and the filtered positions are memoized per
/// `(criteria, revision)`.
#[derive(Debug, Default)]
pub struct MessageState {
    records: Vec<MessageRecord>,
    revision: u64,
    criteria: FilterCriteria,
    cache: FilterCache,
}

impl MessageState {
    /// Empty state filtered by `criteria`.
    #[must_use]
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    /// Full sequence in arrival order.
    #[must_use]
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    /// Revision of the full sequence.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Current filter inputs.
    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Times the filter has been evaluated.
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.cache.computations()
    }

    /// Append records to the end of the sequence.
    ///
    /// Returns `true` if anything was added.
    pub fn append(&mut self, records: impl IntoIterator<Item = MessageRecord>) -> bool {
        let before = self.records.len();
        self.records.extend(records);
        if self.records.len() == before {
            return false;
        }
        self.revision += 1;
        true
    }

    /// Replace the free-text query. Returns `true` if it changed.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if self.criteria.query == query {
            return false;
        }
        self.criteria.query = query;
        true
    }

    /// Replace the sender filter. Returns `true` if it changed.
    pub fn set_sender(&mut self, sender: impl Into<String>) -> bool {
        let sender = sender.into();
        if self.criteria.sender == sender {
            return false;
        }
        self.criteria.sender = sender;
        true
    }

    /// Replace the body pattern. Returns `true` if it changed.
    pub fn set_pattern(&mut self, pattern: Option<Regex>) -> bool {
        let same = match (&self.criteria.pattern, &pattern) {
            (None, None) => true,
            (Some(a), Some(b)) => a.as_str() == b.as_str(),
            _ => false,
        };
        if same {
            return false;
        }
        self.criteria.pattern = pattern;
        true
    }

    /// Replace all filter inputs. Returns `true` if they changed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        if self.criteria == criteria {
            return false;
        }
        self.criteria = criteria;
        true
    }

    /// Filtered view for the current inputs.
    pub fn view(&mut self) -> FilteredView {
        let positions = self
            .cache
            .positions(&self.records, self.revision, &self.criteria);
        FilteredView {
            records: positions.iter().map(|&i| self.records[i].clone()).collect(),
            total: self.records.len(),
            criteria: self.criteria.clone(),
            revision: self.revision,
        }
    }
}
