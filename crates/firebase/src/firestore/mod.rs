//! Cloud Firestore REST v1 client.
//!
//! Reads use `runQuery` and document `GET`; writes go through
//! `documents:commit` so update masks, existence preconditions and
//! server-time transforms are applied atomically. Requests carry the web
//! API key, plus the signed-in user's ID token for scoped clients so
//! security rules see the caller.

pub mod codec;
mod poll;

pub use poll::PollConfig;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::StoreError;
use crate::live::{LiveQuery, live_channel};
use crate::store::{Direction, Document, DocumentStore, Fields, Query, Snapshot, auto_id};
use codec::{Value, decode_fields, encode_fields, field_path};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Client for one project's default database.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
    id_token: Option<SecretString>,
}

struct FirestoreClientInner {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: SecretString,
    poll: PollConfig,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.inner.base_url)
            .field("project_id", &self.inner.project_id)
            .field("api_key", &"[REDACTED]")
            .field("scoped", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}

/// A stored document as returned by the API.
#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl RestDocument {
    fn into_document(self) -> Result<Document, StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::InvalidDocument(self.name.clone()))?
            .to_owned();
        Ok(Document::new(id, decode_fields(self.fields)))
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<RestDocument>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy)]
enum Precondition {
    Any,
    MustExist,
    MustNotExist,
}

impl FirestoreClient {
    /// Create a client for `project_id`.
    #[must_use]
    pub fn new(project_id: impl Into<String>, api_key: SecretString, poll: PollConfig) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, project_id, api_key, poll)
    }

    /// Create a client against another API root (emulator, proxy).
    #[must_use]
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        api_key: SecretString,
        poll: PollConfig,
    ) -> Self {
        Self {
            inner: Arc::new(FirestoreClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_owned(),
                project_id: project_id.into(),
                api_key,
                poll,
            }),
            id_token: None,
        }
    }

    /// `projects/{project}/databases/(default)/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.inner.project_id
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_root())
    }

    fn url(&self, path: &str) -> Result<url::Url, StoreError> {
        let mut url = url::Url::parse(&format!("{}/{path}", self.inner.base_url))
            .map_err(|e| StoreError::InvalidDocument(format!("bad request URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: url::Url) -> reqwest::RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match &self.id_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Turn a non-success response into `StoreError::Service`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        let error = serde_json::from_str::<ErrorEnvelope>(&body)
            .or_else(|_| {
                serde_json::from_str::<Vec<ErrorEnvelope>>(&body).and_then(|mut errors| {
                    errors.pop().ok_or_else(|| serde::de::Error::custom("empty"))
                })
            })
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| ErrorBody {
                message: body.chars().take(200).collect(),
                status: String::new(),
            });

        tracing::error!(
            status = %status,
            code = %error.status,
            message = %error.message,
            "Firestore request failed"
        );

        Err(StoreError::Service {
            status: status.as_u16(),
            code: error.status,
            message: error.message,
        })
    }

    fn structured_query(collection: &str, query: &Query) -> serde_json::Value {
        let mut structured = json!({ "from": [{ "collectionId": collection }] });

        if let Some(filter) = &query.filter {
            structured["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": field_path(&filter.field) },
                    "op": "EQUAL",
                    "value": Value::from_json(&filter.value),
                }
            });
        }

        if let Some(order) = &query.order_by {
            let direction = match order.direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": field_path(&order.field) },
                "direction": direction,
            }]);
        }

        json!({ "structuredQuery": structured })
    }

    async fn run_query(&self, collection: &str, query: &Query) -> Result<Snapshot, StoreError> {
        let url = self.url(&format!("{}:runQuery", self.documents_root()))?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&Self::structured_query(collection, query))
            .send()
            .await?;
        let items: Vec<RunQueryItem> = Self::check(response).await?.json().await?;

        let documents = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RestDocument::into_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot { documents })
    }

    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&self.document_name(collection, id))?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: RestDocument = Self::check(response).await?.json().await?;
        document.into_document().map(Some)
    }

    async fn commit(
        &self,
        collection: &str,
        id: &str,
        data: &Fields,
        mask: bool,
        precondition: Precondition,
        server_timestamps: &[&str],
    ) -> Result<(), StoreError> {
        let mut write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(data),
            }
        });

        if mask {
            let paths: Vec<String> = data.keys().map(|k| field_path(k)).collect();
            write["updateMask"] = json!({ "fieldPaths": paths });
        }

        match precondition {
            Precondition::Any => {}
            Precondition::MustExist => write["currentDocument"] = json!({ "exists": true }),
            Precondition::MustNotExist => write["currentDocument"] = json!({ "exists": false }),
        }

        if !server_timestamps.is_empty() {
            let transforms: Vec<_> = server_timestamps
                .iter()
                .map(|field| {
                    json!({ "fieldPath": field_path(field), "setToServerValue": "REQUEST_TIME" })
                })
                .collect();
            write["updateTransforms"] = json!(transforms);
        }

        let url = self.url(&format!("{}:commit", self.documents_root()))?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;

        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err(StoreError::Service { status: 404, .. })
                if matches!(precondition, Precondition::MustExist) =>
            {
                Err(StoreError::NotFound {
                    collection: collection.to_owned(),
                    id: id.to_owned(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    fn subscribe(&self, collection: &str, query: Query) -> LiveQuery<Snapshot> {
        let (sender, live) = live_channel();
        let client = self.clone();
        let collection = collection.to_owned();
        let label = format!("{collection}:{query:?}");
        let poll = self.inner.poll;

        tokio::spawn(async move {
            poll::run_poll_loop(label, poll, sender, || client.run_query(&collection, &query)).await;
        });

        live
    }

    fn subscribe_document(&self, collection: &str, id: &str) -> LiveQuery<Option<Document>> {
        let (sender, live) = live_channel();
        let client = self.clone();
        let collection = collection.to_owned();
        let id = id.to_owned();
        let label = format!("{collection}/{id}");
        let poll = self.inner.poll;

        tokio::spawn(async move {
            poll::run_poll_loop(label, poll, sender, || client.fetch_document(&collection, &id))
                .await;
        });

        live
    }

    #[instrument(skip(self), fields(scoped = self.id_token.is_some()))]
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.fetch_document(collection, id).await
    }

    #[instrument(skip(self, query))]
    async fn query(&self, collection: &str, query: &Query) -> Result<Snapshot, StoreError> {
        self.run_query(collection, query).await
    }

    #[instrument(skip(self, data))]
    async fn add(
        &self,
        collection: &str,
        data: Fields,
        server_timestamps: &[&str],
    ) -> Result<String, StoreError> {
        let id = auto_id();
        self.commit(
            collection,
            &id,
            &data,
            false,
            Precondition::MustNotExist,
            server_timestamps,
        )
        .await?;
        tracing::debug!(collection, id = %id, "Document added");
        Ok(id)
    }

    #[instrument(skip(self, data))]
    async fn update(&self, collection: &str, id: &str, data: Fields) -> Result<(), StoreError> {
        self.commit(collection, id, &data, true, Precondition::MustExist, &[])
            .await
    }

    #[instrument(skip(self, data))]
    async fn set_merge(&self, collection: &str, id: &str, data: Fields) -> Result<(), StoreError> {
        self.commit(collection, id, &data, true, Precondition::Any, &[])
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&self.document_name(collection, id))?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn with_token(&self, id_token: &SecretString) -> Arc<dyn DocumentStore> {
        Arc::new(Self {
            inner: Arc::clone(&self.inner),
            id_token: Some(id_token.clone()),
        })
    }
}
