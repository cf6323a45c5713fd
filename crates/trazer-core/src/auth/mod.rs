//! Sign-in session.
//!
//! Authentication is a gate, not data: the pipeline only asks whether a
//! user is signed in and, for remote writes, for their ID token. The
//! [`AuthSession`] is passed to whoever needs it.

pub mod credentials;
mod model;
mod provider;
mod session;

pub use credentials::{CredentialError, CredentialResult};
pub use model::{AuthState, User};
pub use provider::{
    GOOGLE_PROVIDER_ID, IDENTITY_TOOLKIT_ENDPOINT, IdentityProvider, IdentityToolkitProvider,
    SECURE_TOKEN_ENDPOINT,
};
pub use session::AuthSession;
