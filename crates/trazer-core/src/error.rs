//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to a remote service failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filter pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sign-in or token exchange failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Remote document store rejected a write.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// The message session task has stopped.
    #[error("Message session closed")]
    SessionClosed,

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] crate::auth::credentials::CredentialError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
