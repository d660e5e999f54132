//! Identity Toolkit (Firebase Auth) REST client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::{AuthProvider, AuthSession, RefreshedTokens};
use crate::error::AuthError;

/// Identity Toolkit API root.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token API root.
pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Email/password auth against a Firebase project.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("identity_url", &self.inner.identity_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Parse `expiresIn` (seconds, as a string) into a lifetime.
fn parse_expires_in(expires_in: &str) -> Result<Duration, AuthError> {
    expires_in
        .parse::<i64>()
        .map(Duration::seconds)
        .map_err(|_| AuthError::InvalidResponse(format!("expiresIn: {expires_in:?}")))
}

impl IdentityClient {
    /// Create a client for the project owning `api_key`.
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self::with_urls(IDENTITY_TOOLKIT_URL, SECURE_TOKEN_URL, api_key)
    }

    /// Create a client against other API roots (emulator, proxy).
    #[must_use]
    pub fn with_urls(
        identity_url: impl Into<String>,
        token_url: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                http: reqwest::Client::new(),
                identity_url: identity_url.into().trim_end_matches('/').to_owned(),
                token_url: token_url.into().trim_end_matches('/').to_owned(),
                api_key,
            }),
        }
    }

    fn url(&self, root: &str, path: &str) -> Result<url::Url, AuthError> {
        let mut url = url::Url::parse(&format!("{root}/{path}"))
            .map_err(|e| AuthError::InvalidResponse(format!("bad request URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    /// Decode a success body, or the service's error message.
    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AuthError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        tracing::debug!(status = %status, message = %message, "Identity request rejected");
        Err(AuthError::Rejected(message))
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let url = self.url(&self.inner.identity_url, endpoint)?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&PasswordRequest {
                email,
                password: password.expose_secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        let body: PasswordResponse = Self::read(response).await?;
        let lifetime = parse_expires_in(&body.expires_in)?;

        Ok(AuthSession {
            uid: body.local_id,
            email: if body.email.is_empty() {
                email.to_owned()
            } else {
                body.email
            },
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_at: Utc::now() + lifetime,
        })
    }
}

#[async_trait]
impl AuthProvider for IdentityClient {
    #[instrument(skip(self, password))]
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    #[instrument(skip(self, password))]
    async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        self.password_call("accounts:signUp", email, password).await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, AuthError> {
        let url = self.url(&self.inner.token_url, "token")?;
        let response = self
            .inner
            .http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await?;

        let body: RefreshResponse = Self::read(response).await?;
        let lifetime = parse_expires_in(&body.expires_in)?;

        Ok(RefreshedTokens {
            uid: body.user_id,
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_at: Utc::now() + lifetime,
        })
    }
}
