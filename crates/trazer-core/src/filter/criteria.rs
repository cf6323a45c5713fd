//! Filter inputs.

use regex::Regex;

/// Inputs to the filter engine.
///
/// `query` matches message bodies ignoring case, `sender` matches the
/// address with exact case. Empty strings disable their predicate.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Free-text search over message bodies.
    pub query: String,
    /// Substring the sender address must contain.
    pub sender: String,
    /// Optional pattern message bodies must match.
    pub pattern: Option<Regex>,
}

impl FilterCriteria {
    /// Criteria that keep every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the sender filter.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Set the body pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.pattern = pattern;
        self
    }

    /// Compile a pattern string; an empty string means no pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn compile_pattern(pattern: &str) -> Result<Option<Regex>, regex::Error> {
        if pattern.is_empty() {
            Ok(None)
        } else {
            Regex::new(pattern).map(Some)
        }
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.sender.is_empty() && self.pattern.is_none()
    }

    fn pattern_str(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

impl PartialEq for FilterCriteria {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
            && self.sender == other.sender
            && self.pattern_str() == other.pattern_str()
    }
}

impl Eq for FilterCriteria {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_compiles_to_none() {
        assert!(FilterCriteria::compile_pattern("").unwrap().is_none());
        assert!(FilterCriteria::compile_pattern(r"\d+").unwrap().is_some());
        assert!(FilterCriteria::compile_pattern("(").is_err());
    }

    #[test]
    fn equality_compares_pattern_source() {
        let a = FilterCriteria::new()
            .with_query("x")
            .with_pattern(FilterCriteria::compile_pattern("a+").unwrap());
        let b = FilterCriteria::new()
            .with_query("x")
            .with_pattern(FilterCriteria::compile_pattern("a+").unwrap());
        let c = b.clone().with_pattern(None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn is_empty() {
        assert!(FilterCriteria::new().is_empty());
        assert!(!FilterCriteria::new().with_sender("5").is_empty());
    }
}
