//! Session manager error types.

use thiserror::Error;

/// Errors from signing a customer in or out.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The identity service rejected the request. Displays the service's
    /// message unchanged (`EMAIL_EXISTS`, `INVALID_LOGIN_CREDENTIALS`, ...).
    #[error(transparent)]
    Auth(#[from] zypso_firebase::AuthError),

    /// The browser session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
