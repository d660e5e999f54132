//! Error types for the document store and auth seams.
//!
//! Service-reported failures display the service's own message so callers
//! can surface it to users unchanged.

use thiserror::Error;

/// Errors from [`DocumentStore`](crate::DocumentStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before the service answered.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the request.
    #[error("{message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Canonical status name (`PERMISSION_DENIED`, `NOT_FOUND`, ...).
        code: String,
        /// Human-readable message from the service.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An update targeted a document that does not exist.
    #[error("No document to update: {collection}/{id}")]
    NotFound {
        /// Collection name.
        collection: String,
        /// Document ID.
        id: String,
    },

    /// The service returned a document this client could not interpret.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl StoreError {
    /// Whether the service refused the caller's credentials.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Service { status: 401 | 403, .. })
    }
}

/// Errors from [`AuthProvider`](crate::AuthProvider) operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed before the service answered.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the credentials (`EMAIL_EXISTS`,
    /// `INVALID_LOGIN_CREDENTIALS`, ...).
    #[error("{0}")]
    Rejected(String),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with an unexpected shape.
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
}
