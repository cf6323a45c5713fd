//! Settings model.

use serde::{Deserialize, Serialize};

use crate::filter::FilterCriteria;
use crate::inbox::{PermissionGate, PermissionStatus};
use crate::sync::DEFAULT_COLLECTION;

/// Environment variable overriding the Firebase project id.
pub const PROJECT_ID_ENV: &str = "TRAZER_PROJECT_ID";

/// Environment variable overriding the Firebase web API key.
pub const API_KEY_ENV: &str = "TRAZER_API_KEY";

/// Remote document store and identity provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Firebase project id.
    pub project_id: Option<String>,
    /// Firebase web API key.
    pub api_key: Option<String>,
    /// Collection messages are written to.
    pub collection: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Apply environment overrides on top of the stored values.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(PROJECT_ID_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    fn with_overrides(mut self, project_id: Option<String>, api_key: Option<String>) -> Self {
        if let Some(project_id) = project_id.filter(|v| !v.is_empty()) {
            self.project_id = Some(project_id);
        }
        if let Some(api_key) = api_key.filter(|v| !v.is_empty()) {
            self.api_key = Some(api_key);
        }
        self
    }
}

/// Application settings that persist across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Substring sender addresses must contain; empty keeps all.
    pub sender: String,
    /// Regular expression message bodies must match; empty keeps all.
    pub regex_pattern: String,
    /// Whether the user allowed reading the SMS inbox.
    pub inbox_access: PermissionStatus,
    /// Remote store configuration.
    pub remote: RemoteConfig,
}

impl AppSettings {
    /// Filter criteria for a text query under these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored pattern does not compile.
    pub fn criteria(&self, query: &str) -> Result<FilterCriteria, regex::Error> {
        Ok(FilterCriteria::new()
            .with_query(query)
            .with_sender(self.sender.clone())
            .with_pattern(FilterCriteria::compile_pattern(&self.regex_pattern)?))
    }
}

impl PermissionGate for AppSettings {
    fn status(&self) -> PermissionStatus {
        self.inbox_access
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let settings = AppSettings::default();
        assert!(settings.sender.is_empty());
        assert!(settings.regex_pattern.is_empty());
        assert_eq!(settings.status(), PermissionStatus::Denied);
        assert_eq!(settings.remote.collection, "messages");
    }

    #[test]
    fn missing_keys_use_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"sender": "BANK"}"#).unwrap();
        assert_eq!(settings.sender, "BANK");
        assert!(settings.regex_pattern.is_empty());
        assert_eq!(settings.remote, RemoteConfig::default());
    }

    #[test]
    fn serializes_camel_case() {
        let settings = AppSettings {
            regex_pattern: r"\d+".to_string(),
            inbox_access: PermissionStatus::Granted,
            ..AppSettings::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["regexPattern"], r"\d+");
        assert_eq!(json["inboxAccess"], "granted");
    }

    #[test]
    fn criteria_carries_sender_and_pattern() {
        let settings = AppSettings {
            sender: "555".to_string(),
            regex_pattern: "code".to_string(),
            ..AppSettings::default()
        };
        let criteria = settings.criteria("hi").unwrap();
        assert_eq!(criteria.query, "hi");
        assert_eq!(criteria.sender, "555");
        assert!(criteria.pattern.is_some());

        let bad = AppSettings {
            regex_pattern: "[".to_string(),
            ..AppSettings::default()
        };
        assert!(bad.criteria("").is_err());
    }

    #[test]
    fn overrides_replace_non_empty_values() {
        let config = RemoteConfig {
            project_id: Some("stored".to_string()),
            ..RemoteConfig::default()
        }
        .with_overrides(Some(String::new()), Some("key".to_string()));
        assert_eq!(config.project_id.as_deref(), Some("stored"));
        assert_eq!(config.api_key.as_deref(), Some("key"));
    }
}
