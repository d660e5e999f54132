//! Zypso Mart Firebase - document store, auth and live projections.
//!
//! The shop owns no persistence. Every read, write, live subscription and
//! sign-in goes through the managed Firebase services, reached over their
//! REST APIs. This crate hides those services behind two object-safe seams
//! so the web binaries and tests can run against either backend:
//!
//! - [`DocumentStore`] - collections of JSON documents, one-shot reads,
//!   writes with server timestamps, and [`LiveQuery`] subscriptions
//! - [`AuthProvider`] - email/password sign-in, registration and token refresh
//!
//! # Backends
//!
//! - [`FirestoreClient`] + [`IdentityClient`] - Cloud Firestore REST v1 and
//!   Identity Toolkit. Live queries poll and publish only changed snapshots.
//! - [`MemoryBackend`] - in-process store and accounts for tests and local
//!   development. Writes notify subscribers immediately.
//!
//! # Projections
//!
//! [`Projection`] and [`DocumentMirror`] turn a live query into typed,
//! watchable local state. Undecodable documents are logged and skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use zypso_firebase::{MemoryBackend, Projection, Query};
//!
//! let backend = MemoryBackend::new();
//! let products: Projection<Product> =
//!     Projection::spawn("products", backend.subscribe("products", Query::all()));
//! products.wait_for(|p| !p.is_empty()).await?;
//! let snapshot = products.current();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod auth;
pub mod config;
mod error;
pub mod firestore;
mod identity;
mod live;
mod memory;
mod projection;
mod store;

pub use auth::{AuthProvider, AuthSession, RefreshedTokens};
pub use config::{Backend, BackendConfig, ConfigError, FirebaseConfig};
pub use error::{AuthError, StoreError};
pub use firestore::{FirestoreClient, PollConfig};
pub use identity::IdentityClient;
pub use live::{LiveQuery, LiveSender, live_channel};
pub use memory::MemoryBackend;
pub use projection::{DocumentMirror, Projection, ProjectionClosed};
pub use store::{
    Direction, Document, DocumentStore, FieldFilter, Fields, OrderBy, Query, Snapshot, auto_id,
    to_fields,
};
