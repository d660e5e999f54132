//! Session manager.
//!
//! Tracks which customer, if any, is signed in to a browser session. Signing
//! in starts the customer's order feed; signing out stops it. ID tokens are
//! refreshed shortly before they expire; a refused refresh signs the
//! customer out.

mod error;

pub use error::SessionError;

use chrono::Utc;
use secrecy::SecretString;
use tower_sessions::Session;

use zypso_firebase::AuthSession;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Signs customers in and out of one browser session.
pub struct SessionManager<'a> {
    state: &'a AppState,
    session: &'a Session,
}

impl<'a> SessionManager<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState, session: &'a Session) -> Self {
        Self { state, session }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` with the service's message when the
    /// credentials are refused.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentCustomer, SessionError> {
        let account = self.state.auth().sign_in(email.trim(), password).await?;
        self.start(&account).await
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` with the service's message
    /// (`EMAIL_EXISTS`, `WEAK_PASSWORD ...`) when registration fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentCustomer, SessionError> {
        let account = self.state.auth().register(email.trim(), password).await?;
        tracing::info!(uid = %account.uid, "Customer registered");
        self.start(&account).await
    }

    /// Sign out and stop the customer's order feed. Signing out an
    /// anonymous session does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Session` if the session cannot be modified.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let Some(customer) = self.stored().await else {
            return Ok(());
        };

        if let Err(e) = self.state.auth().sign_out(customer.uid.as_str()).await {
            tracing::warn!(error = %e, "Identity service sign-out failed");
        }
        self.state.customer_orders().stop(&customer.uid).await;
        clear_current_customer(self.session).await?;
        clear_sentry_user();

        tracing::info!(uid = %customer.uid, "Customer signed out");
        Ok(())
    }

    /// The signed-in customer, with a fresh ID token.
    pub async fn current(&self) -> Option<CurrentCustomer> {
        let mut customer = self.stored().await?;
        if !customer.needs_refresh(Utc::now()) {
            return Some(customer);
        }

        match self.state.auth().refresh(&customer.refresh_token()).await {
            Ok(tokens) => {
                customer.apply_refresh(&tokens);
                if let Err(e) = set_current_customer(self.session, &customer).await {
                    tracing::error!(error = %e, "Failed to store refreshed tokens");
                }
                tracing::debug!(uid = %customer.uid, "ID token refreshed");
                Some(customer)
            }
            Err(e) => {
                tracing::warn!(uid = %customer.uid, error = %e, "Token refresh refused; signing out");
                if let Err(e) = self.sign_out().await {
                    tracing::error!(error = %e, "Failed to clear expired session");
                }
                None
            }
        }
    }

    async fn stored(&self) -> Option<CurrentCustomer> {
        self.session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
    }

    async fn start(&self, account: &AuthSession) -> Result<CurrentCustomer, SessionError> {
        let customer = CurrentCustomer::from(account);

        // A new identity gets a new session ID; the cart carries over.
        self.session.cycle_id().await?;
        set_current_customer(self.session, &customer).await?;
        self.state.customer_orders().feed(&customer).await;
        set_sentry_user(&customer.uid, Some(&customer.email));

        tracing::info!(uid = %customer.uid, "Customer signed in");
        Ok(customer)
    }
}
