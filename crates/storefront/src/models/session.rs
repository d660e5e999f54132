//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use zypso_core::UserId;
use zypso_firebase::{AuthSession, RefreshedTokens};

/// Refresh the ID token when it expires within this window.
const REFRESH_MARGIN_SECONDS: i64 = 300;

/// Session-stored customer identity.
///
/// Tokens are kept as plain strings so the session store can serialize
/// them; `Debug` redacts both.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Account ID; the `userId` written on orders.
    pub uid: UserId,
    pub email: String,
    id_token: String,
    refresh_token: String,
    /// When the ID token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl CurrentCustomer {
    /// Token presented to the document store on the customer's behalf.
    #[must_use]
    pub fn id_token(&self) -> SecretString {
        SecretString::from(self.id_token.as_str())
    }

    /// Token exchanged for a new ID token.
    #[must_use]
    pub fn refresh_token(&self) -> SecretString {
        SecretString::from(self.refresh_token.as_str())
    }

    /// Whether the ID token expires within the refresh margin of `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(REFRESH_MARGIN_SECONDS)
    }

    /// Replace the tokens after a refresh.
    pub fn apply_refresh(&mut self, tokens: &RefreshedTokens) {
        self.id_token = tokens.id_token.expose_secret().to_owned();
        self.refresh_token = tokens.refresh_token.expose_secret().to_owned();
        self.expires_at = tokens.expires_at;
    }
}

impl From<&AuthSession> for CurrentCustomer {
    fn from(session: &AuthSession) -> Self {
        Self {
            uid: UserId::new(session.uid.as_str()),
            email: session.email.clone(),
            id_token: session.id_token.expose_secret().to_owned(),
            refresh_token: session.refresh_token.expose_secret().to_owned(),
            expires_at: session.expires_at,
        }
    }
}

impl std::fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session keys for customer and cart data.
pub mod keys {
    /// Key for storing the signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for storing the cart.
    pub const CART: &str = "cart";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(expires_at: DateTime<Utc>) -> CurrentCustomer {
        CurrentCustomer::from(&AuthSession {
            uid: "u1".to_string(),
            email: "asha@example.com".to_string(),
            id_token: SecretString::from("id-token-1"),
            refresh_token: SecretString::from("refresh-1"),
            expires_at,
        })
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", customer(Utc::now()));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("id-token-1"));
        assert!(!debug.contains("refresh-1"));
    }

    #[test]
    fn test_needs_refresh_within_margin() {
        let now = Utc::now();
        assert!(customer(now + Duration::seconds(60)).needs_refresh(now));
        assert!(!customer(now + Duration::hours(1)).needs_refresh(now));
    }

    #[test]
    fn test_apply_refresh_replaces_tokens() {
        let now = Utc::now();
        let mut current = customer(now);
        current.apply_refresh(&RefreshedTokens {
            uid: "u1".to_string(),
            id_token: SecretString::from("id-token-2"),
            refresh_token: SecretString::from("refresh-2"),
            expires_at: now + Duration::hours(1),
        });

        assert_eq!(current.id_token().expose_secret(), "id-token-2");
        assert_eq!(current.refresh_token().expose_secret(), "refresh-2");
        assert!(!current.needs_refresh(now));
    }
}
