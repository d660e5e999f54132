//! The document store seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::live::LiveQuery;

/// Document body: top-level field name to JSON value.
pub type Fields = serde_json::Map<String, Value>;

/// Length of generated document IDs.
const AUTO_ID_LEN: usize = 20;

/// Generate a document ID the way Firestore clients do: 20 random
/// alphanumeric characters.
#[must_use]
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// Serialize a write payload into document fields.
///
/// # Errors
///
/// Returns `StoreError::Json` if the payload does not serialize, or
/// `StoreError::InvalidDocument` if it is not a JSON object.
pub fn to_fields<T: Serialize>(payload: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(payload)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidDocument(format!(
            "payload must be an object, got {other}"
        ))),
    }
}

/// A document: its ID within the collection plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    /// Create a document.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode into a record type. The document ID is provided as `id`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the fields don't match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.data.clone();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// A full point-in-time copy of a query's result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    /// Decode every document, skipping (and logging) the ones that fail.
    #[must_use]
    pub fn decode_all<T: DeserializeOwned>(&self, label: &str) -> Vec<T> {
        self.documents
            .iter()
            .filter_map(|doc| match doc.decode() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection = label,
                        id = %doc.id,
                        error = %e,
                        "Skipping undecodable document"
                    );
                    None
                }
            })
            .collect()
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Equality filter on one top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Ordering on one top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query: optional equality filter and optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Every document in the collection, in store order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }
}

/// A collection-oriented document database.
///
/// Implementations are cheap to share behind `Arc<dyn DocumentStore>`.
/// Subscriptions require a Tokio runtime.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Subscribe to a query. The handle yields a full snapshot on every change.
    fn subscribe(&self, collection: &str, query: Query) -> LiveQuery<Snapshot>;

    /// Subscribe to a single document. `None` while the document does not exist.
    fn subscribe_document(&self, collection: &str, id: &str) -> LiveQuery<Option<Document>>;

    /// Read one document.
    async fn get_document(&self, collection: &str, id: &str)
    -> Result<Option<Document>, StoreError>;

    /// Run a query once.
    async fn query(&self, collection: &str, query: &Query) -> Result<Snapshot, StoreError>;

    /// Create a document with a generated ID. Each field named in
    /// `server_timestamps` is set to the server's commit time.
    async fn add(
        &self,
        collection: &str,
        data: Fields,
        server_timestamps: &[&str],
    ) -> Result<String, StoreError>;

    /// Overwrite the given fields of an existing document.
    ///
    /// Fails with `StoreError::NotFound` (or the service's equivalent) when
    /// the document does not exist.
    async fn update(&self, collection: &str, id: &str, data: Fields) -> Result<(), StoreError>;

    /// Write the given fields, creating the document if needed. Fields not
    /// in `data` are left untouched.
    async fn set_merge(&self, collection: &str, id: &str, data: Fields)
    -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// A copy of this store that acts as the signed-in user.
    fn with_token(&self, id_token: &SecretString) -> Arc<dyn DocumentStore>;
}
