//! Identity providers.

use std::future::Future;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::model::User;
use crate::{Error, Result};

/// Identity Toolkit REST endpoint.
pub const IDENTITY_TOOLKIT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token REST endpoint.
pub const SECURE_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1";

/// Provider id for Google federated sign-in.
pub const GOOGLE_PROVIDER_ID: &str = "google.com";

/// External service that signs users in and issues tokens.
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Exchange a federated ID token (e.g. from Google) for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    fn sign_in_with_id_token(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Obtain fresh tokens for a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected or the request fails.
    fn refresh(&self, user: &User) -> impl Future<Output = Result<User>> + Send;
}

/// Identity provider backed by the Firebase Identity Toolkit REST API.
pub struct IdentityToolkitProvider {
    client: Client,
    api_key: String,
    identity_endpoint: String,
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl IdentityToolkitProvider {
    /// Create a provider for the project owning `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            identity_endpoint: IDENTITY_TOOLKIT_ENDPOINT.to_string(),
            token_endpoint: SECURE_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Override both endpoints, e.g. for the auth emulator.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        identity_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        self.identity_endpoint = identity_endpoint.into();
        self.token_endpoint = token_endpoint.into();
        self
    }

    async fn post<T>(&self, url: String, body: serde_json::Value) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map_or_else(|_| format!("{status}"), |body| body.error.message);
            return Err(Error::Auth(message));
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn user_from(response: SignInResponse) -> User {
        User {
            uid: response.local_id,
            email: response.email,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expiry(&response.expires_in),
        }
    }
}

/// Absolute expiry time from a provider's `expiresIn` seconds string.
fn expiry(expires_in: &str) -> chrono::DateTime<Utc> {
    let seconds = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(seconds)
}

impl IdentityProvider for IdentityToolkitProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User> {
        let url = format!("{}/accounts:signInWithPassword", self.identity_endpoint);
        let response: SignInResponse = self
            .post(
                url,
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        debug!("Signed in with password as {}", response.local_id);
        Ok(Self::user_from(response))
    }

    async fn sign_in_with_id_token(&self, provider_id: &str, id_token: &str) -> Result<User> {
        let url = format!("{}/accounts:signInWithIdp", self.identity_endpoint);
        let response: SignInResponse = self
            .post(
                url,
                json!({
                    "postBody": format!("id_token={id_token}&providerId={provider_id}"),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        debug!("Signed in with {provider_id} as {}", response.local_id);
        Ok(Self::user_from(response))
    }

    async fn refresh(&self, user: &User) -> Result<User> {
        let url = format!("{}/token", self.token_endpoint);
        let response: RefreshResponse = self
            .post(
                url,
                json!({ "grant_type": "refresh_token", "refresh_token": user.refresh_token }),
            )
            .await?;
        Ok(User {
            uid: response.user_id,
            email: user.email.clone(),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expiry(&response.expires_in),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_sign_in_response() {
        let body = r#"{
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "abc",
            "email": "me@example.com",
            "idToken": "id-token",
            "refreshToken": "refresh-token",
            "expiresIn": "3600",
            "registered": true
        }"#;
        let response: SignInResponse = serde_json::from_str(body).unwrap();
        let user = IdentityToolkitProvider::user_from(response);
        assert_eq!(user.uid, "abc");
        assert_eq!(user.email.as_deref(), Some("me@example.com"));
        assert!(!user.is_expired(Utc::now()));
    }

    #[test]
    fn parses_error_body() {
        let body = r#"{"error": {"code": 400, "message": "INVALID_PASSWORD", "errors": []}}"#;
        let parsed: ErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "INVALID_PASSWORD");
    }

    #[test]
    fn bad_expiry_defaults_to_an_hour() {
        let at = expiry("soon");
        let delta = at - Utc::now();
        assert!(delta > Duration::minutes(59));
    }
}
