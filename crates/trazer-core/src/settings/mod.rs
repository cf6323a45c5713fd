//! Persisted user settings.
//!
//! The sender filter, the body pattern and the inbox access decision are
//! stored as JSON in the user's config directory.

mod model;
mod store;
mod validation;

pub use model::{API_KEY_ENV, AppSettings, PROJECT_ID_ENV, RemoteConfig};
pub use store::{SettingsStore, config_dir, data_dir};
pub use validation::{SettingsError, validate_settings};
