//! The authentication seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::error::AuthError;

/// A signed-in account.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Stable account ID (`localId`).
    pub uid: String,
    pub email: String,
    /// Short-lived token presented to the document store.
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Tokens issued by a refresh.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub uid: String,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// Email/password account service.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Sign in to an existing account.
    async fn sign_in(&self, email: &str, password: &SecretString)
    -> Result<AuthSession, AuthError>;

    /// Create an account and sign in to it.
    async fn register(&self, email: &str, password: &SecretString)
    -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a fresh ID token.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, AuthError>;

    /// End a session. Token-based services have nothing to revoke.
    async fn sign_out(&self, _uid: &str) -> Result<(), AuthError> {
        Ok(())
    }
}
