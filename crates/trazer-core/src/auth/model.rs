//! Sign-in state types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in user and their tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider user id.
    pub uid: String,
    /// Account email, absent for some federated sign-ins.
    pub email: Option<String>,
    /// Short-lived token sent with remote requests.
    pub id_token: String,
    /// Long-lived token used to obtain a new ID token.
    pub refresh_token: String,
    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl User {
    /// Whether the ID token has expired, with a one-minute margin.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(1) >= self.expires_at
    }
}

/// Whether someone is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody is signed in.
    #[default]
    Unauthenticated,
    /// A user is signed in.
    Authenticated(User),
}

impl AuthState {
    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated => None,
        }
    }

    /// ID token of the signed-in user, if any.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.user().map(|user| user.id_token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(expires_at: DateTime<Utc>) -> User {
        User {
            uid: "u1".to_string(),
            email: Some("a@example.com".to_string()),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
        }
    }

    #[test]
    fn default_is_unauthenticated() {
        let state = AuthState::default();
        assert!(!state.is_authenticated());
        assert!(state.id_token().is_none());
    }

    #[test]
    fn authenticated_exposes_token() {
        let state = AuthState::Authenticated(user(Utc::now()));
        assert!(state.is_authenticated());
        assert_eq!(state.id_token(), Some("id"));
    }

    #[test]
    fn expiry_has_margin() {
        let now = Utc::now();
        assert!(user(now + Duration::seconds(30)).is_expired(now));
        assert!(!user(now + Duration::minutes(5)).is_expired(now));
    }
}
