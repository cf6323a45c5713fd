//! Filter engine for the in-memory message sequence.
//!
//! Filtering is a pure function of `(records, criteria)`: a conjunction of
//! a case-insensitive body search, a case-sensitive sender match and an
//! optional body pattern. The output is always a subsequence of the input
//! in the same relative order. [`FilterCache`] memoizes the last result.

mod criteria;
mod engine;

pub use criteria::FilterCriteria;
pub use engine::{FilterCache, apply, filter_positions};
