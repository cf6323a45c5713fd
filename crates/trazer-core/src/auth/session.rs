//! Sign-in session gate.

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::credentials;
use super::model::{AuthState, User};
use super::provider::{GOOGLE_PROVIDER_ID, IdentityProvider};
use crate::{Error, Result};

/// Holder of the current sign-in state.
///
/// Consumers receive the session (or a [`watch::Receiver`] from
/// [`AuthSession::subscribe`]) explicitly instead of listening to a global.
pub struct AuthSession<P> {
    provider: P,
    state: watch::Sender<AuthState>,
    persist: bool,
}

impl<P: IdentityProvider> AuthSession<P> {
    /// Create a signed-out session that is not persisted.
    #[must_use]
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            provider,
            state,
            persist: false,
        }
    }

    /// Create a session persisted in the system keyring, restoring any
    /// stored sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring cannot be read.
    pub fn restore(provider: P) -> Result<Self> {
        let mut session = Self::new(provider);
        session.persist = true;
        if let Some(user) = credentials::load_user()? {
            info!("Restored session for user {}", user.uid);
            session.state.send_replace(AuthState::Authenticated(user));
        }
        Ok(session)
    }

    /// Observe sign-in changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current sign-in state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// ID token of the signed-in user, if any.
    #[must_use]
    pub fn id_token(&self) -> Option<String> {
        self.state.borrow().id_token().map(str::to_string)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if either field is blank or the provider rejects
    /// the credentials.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Auth(
                "email and password are required".to_string(),
            ));
        }
        let user = self.provider.sign_in_with_password(email, password).await?;
        Ok(self.set_user(user))
    }

    /// Sign in with a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is blank or rejected.
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<User> {
        if id_token.trim().is_empty() {
            return Err(Error::Auth("Google ID token is required".to_string()));
        }
        let user = self
            .provider
            .sign_in_with_id_token(GOOGLE_PROVIDER_ID, id_token)
            .await?;
        Ok(self.set_user(user))
    }

    /// Refresh the ID token if it has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is signed in or the refresh is rejected.
    pub async fn ensure_fresh(&self) -> Result<User> {
        let user = self
            .current_user()
            .ok_or_else(|| Error::Auth("not signed in".to_string()))?;
        if !user.is_expired(Utc::now()) {
            return Ok(user);
        }
        let refreshed = self.provider.refresh(&user).await?;
        Ok(self.set_user(refreshed))
    }

    /// Sign out and forget any stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn sign_out(&self) -> Result<()> {
        self.state.send_replace(AuthState::Unauthenticated);
        if self.persist {
            credentials::delete_user()?;
        }
        info!("Signed out");
        Ok(())
    }

    fn set_user(&self, user: User) -> User {
        if self.persist {
            if let Err(e) = credentials::store_user(&user) {
                warn!("Signed in but could not persist session: {e}");
            }
        }
        info!("Signed in as {}", user.uid);
        self.state
            .send_replace(AuthState::Authenticated(user.clone()));
        user
    }
}
