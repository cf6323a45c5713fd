//! Persisted sign-in using the system keyring.
//!
//! The signed-in [`User`] is kept in the platform's native credential
//! storage so a session survives restarts:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use super::model::User;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "trazer";

/// Credential type identifier for the signed-in session.
const SESSION_CREDENTIAL: &str = "session";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Stored session could not be encoded or decoded.
    #[error("Stored session is unreadable: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Generates the keyring entry key for a credential.
fn credential_key(credential_type: &str) -> String {
    format!("{SERVICE_NAME}_{credential_type}")
}

fn session_entry() -> CredentialResult<Entry> {
    Ok(Entry::new(SERVICE_NAME, &credential_key(SESSION_CREDENTIAL))?)
}

/// Stores the signed-in user in the system keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_user(user: &User) -> CredentialResult<()> {
    let entry = session_entry()?;
    entry.set_password(&serde_json::to_string(user)?)?;
    debug!("Stored session for user {}", user.uid);
    Ok(())
}

/// Retrieves the signed-in user from the system keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails or the entry is corrupt.
pub fn load_user() -> CredentialResult<Option<User>> {
    let entry = session_entry()?;
    match entry.get_password() {
        Ok(secret) => Ok(Some(serde_json::from_str(&secret)?)),
        Err(keyring::Error::NoEntry) => {
            debug!("No stored session found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the stored session from the keyring.
///
/// A missing entry is not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn delete_user() -> CredentialResult<()> {
    let entry = session_entry()?;
    match entry.delete_credential() {
        Ok(()) => debug!("Deleted stored session"),
        Err(keyring::Error::NoEntry) => debug!("No stored session to delete"),
        Err(e) => {
            warn!("Failed to delete stored session: {e}");
            return Err(e.into());
        }
    }
    Ok(())
}
