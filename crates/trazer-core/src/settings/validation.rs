//! Settings validation.

use super::model::AppSettings;

/// Validation error for application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The regex pattern does not compile.
    InvalidPattern(String),
    /// The remote collection name is empty.
    EmptyCollection,
    /// The remote collection name contains a path separator.
    InvalidCollection,
}

impl SettingsError {
    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidPattern(_) => "regexPattern",
            Self::EmptyCollection | Self::InvalidCollection => "remote.collection",
        }
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern(reason) => write!(f, "Invalid regex pattern: {reason}"),
            Self::EmptyCollection => write!(f, "Collection name is required"),
            Self::InvalidCollection => write!(f, "Collection name must not contain '/'"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Validate settings before they are saved.
///
/// # Errors
///
/// Returns every problem found.
pub fn validate_settings(settings: &AppSettings) -> Result<(), Vec<SettingsError>> {
    let mut errors = Vec::new();

    if !settings.regex_pattern.is_empty() {
        if let Err(e) = regex::Regex::new(&settings.regex_pattern) {
            errors.push(SettingsError::InvalidPattern(e.to_string()));
        }
    }

    let collection = settings.remote.collection.trim();
    if collection.is_empty() {
        errors.push(SettingsError::EmptyCollection);
    } else if collection.contains('/') {
        errors.push(SettingsError::InvalidCollection);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(validate_settings(&AppSettings::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut settings = AppSettings {
            regex_pattern: "(unclosed".to_string(),
            ..AppSettings::default()
        };
        settings.remote.collection = "a/b".to_string();

        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], SettingsError::InvalidPattern(_)));
        assert_eq!(errors[1], SettingsError::InvalidCollection);
        assert_eq!(errors[0].field(), "regexPattern");
    }

    #[test]
    fn empty_collection_is_rejected() {
        let mut settings = AppSettings::default();
        settings.remote.collection = "  ".to_string();
        assert_eq!(
            validate_settings(&settings).unwrap_err(),
            [SettingsError::EmptyCollection]
        );
    }
}
