//! Settings persistence.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::model::AppSettings;
use super::validation::validate_settings;
use crate::inbox::PermissionStatus;
use crate::{Error, Result};

const APP_DIR: &str = "trazer";
const SETTINGS_FILE: &str = "settings.json";

/// Directory holding the settings file.
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Directory holding local data such as the sync mirror.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Settings backed by a JSON file.
///
/// Every setter writes the file before returning, so a value set once is
/// there on the next run.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: AppSettings,
}

impl SettingsStore {
    /// Load settings from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_default() -> Result<Self> {
        Self::load(config_dir().join(SETTINGS_FILE)).await
    }

    /// Load settings from `path`, using defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {:?}, using defaults", path);
                AppSettings::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, settings })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Saved sender filter.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.settings.sender
    }

    /// Saved body pattern.
    #[must_use]
    pub fn regex_pattern(&self) -> &str {
        &self.settings.regex_pattern
    }

    /// Persist a new sender filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_sender(&mut self, sender: impl Into<String>) -> Result<()> {
        self.settings.sender = sender.into();
        self.save().await
    }

    /// Persist a new body pattern. The previous pattern is kept when the new
    /// one does not compile.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the file cannot be
    /// written.
    pub async fn save_regex_pattern(&mut self, pattern: impl Into<String>) -> Result<()> {
        let mut next = self.settings.clone();
        next.regex_pattern = pattern.into();
        self.replace(next).await
    }

    /// Persist the user's inbox access decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn set_inbox_access(&mut self, status: PermissionStatus) -> Result<()> {
        self.settings.inbox_access = status;
        self.save().await
    }

    /// Validate and persist a whole settings value.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the file cannot be written.
    pub async fn replace(&mut self, settings: AppSettings) -> Result<()> {
        validate_settings(&settings).map_err(|errors| {
            Error::Config(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        self.settings = settings;
        self.save().await
    }

    /// Write the current settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let contents = serde_json::to_string_pretty(&self.settings)?;
        tokio::fs::write(&self.path, contents).await?;
        info!("Settings saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("trazer-settings-{}-{name}", std::process::id()))
            .join(SETTINGS_FILE)
    }

    async fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let path = scratch("missing");
        let store = SettingsStore::load(&path).await.unwrap();
        assert_eq!(store.settings(), &AppSettings::default());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn values_survive_a_reload() {
        let path = scratch("reload");
        let mut store = SettingsStore::load(&path).await.unwrap();
        store.save_sender("BANK").await.unwrap();
        store.save_regex_pattern(r"\d{6}").await.unwrap();
        store
            .set_inbox_access(PermissionStatus::Granted)
            .await
            .unwrap();

        let reloaded = SettingsStore::load(&path).await.unwrap();
        assert_eq!(reloaded.sender(), "BANK");
        assert_eq!(reloaded.regex_pattern(), r"\d{6}");
        assert_eq!(reloaded.settings().inbox_access, PermissionStatus::Granted);
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn invalid_pattern_keeps_previous_value() {
        let path = scratch("invalid");
        let mut store = SettingsStore::load(&path).await.unwrap();
        store.save_regex_pattern("ok").await.unwrap();

        let err = store.save_regex_pattern("(").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(store.regex_pattern(), "ok");

        let reloaded = SettingsStore::load(&path).await.unwrap();
        assert_eq!(reloaded.regex_pattern(), "ok");
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = scratch("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(matches!(
            SettingsStore::load(&path).await,
            Err(Error::Serde(_))
        ));
        cleanup(&path).await;
    }
}
