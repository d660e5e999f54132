//! In-process backend for tests and local development.
//!
//! Implements both seams over plain maps guarded by one mutex. Every write
//! re-evaluates the affected subscriptions and publishes their new
//! snapshots before returning, so a test can write and immediately await
//! the change. Server timestamps are the local clock.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::cmp::Ordering;

use crate::auth::{AuthProvider, AuthSession, RefreshedTokens};
use crate::error::{AuthError, StoreError};
use crate::live::{LiveQuery, LiveSender, live_channel};
use crate::store::{Direction, Document, DocumentStore, Fields, Query, Snapshot, auto_id};

/// Token lifetime handed out by the memory auth provider.
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Minimum password length, matching the hosted service.
const MIN_PASSWORD_LEN: usize = 6;

/// In-memory [`DocumentStore`] and [`AuthProvider`].
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<State>>,
    tokens: Arc<AtomicU64>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct State {
    /// collection -> document id -> fields. `BTreeMap` keeps unordered
    /// queries deterministic.
    collections: HashMap<String, BTreeMap<String, Fields>>,
    queries: Vec<QuerySubscriber>,
    documents: Vec<DocumentSubscriber>,
    accounts: HashMap<String, Account>,
    refresh_tokens: HashMap<String, String>,
    fail_next_write: Option<String>,
}

struct QuerySubscriber {
    collection: String,
    query: Query,
    sender: LiveSender<Snapshot>,
}

struct DocumentSubscriber {
    collection: String,
    id: String,
    sender: LiveSender<Option<Document>>,
}

struct Account {
    uid: String,
    password: String,
}

impl State {
    fn run_query(&self, collection: &str, query: &Query) -> Snapshot {
        let mut documents: Vec<Document> = self
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|(_, data)| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|f| data.get(&f.field) == Some(&f.value))
            })
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect();

        if let Some(order) = &query.order_by {
            documents.sort_by(|a, b| {
                let ordering = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Snapshot { documents }
    }

    fn document(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone()))
    }

    /// Push fresh snapshots to the collection's subscribers and forget the
    /// ones nobody listens to any more.
    fn notify(&mut self, collection: &str) {
        self.queries.retain(|sub| !sub.sender.is_closed());
        self.documents.retain(|sub| !sub.sender.is_closed());

        for sub in self.queries.iter().filter(|sub| sub.collection == collection) {
            sub.sender.publish(self.run_query(&sub.collection, &sub.query));
        }

        for sub in self.documents.iter().filter(|sub| sub.collection == collection) {
            sub.sender.publish(self.document(&sub.collection, &sub.id));
        }
    }

    fn take_failure(&mut self) -> Result<(), StoreError> {
        match self.fail_next_write.take() {
            Some(message) => Err(StoreError::Service {
                status: 503,
                code: "UNAVAILABLE".to_owned(),
                message,
            }),
            None => Ok(()),
        }
    }
}

/// Order values the way the hosted store does across types:
/// missing/null < booleans < numbers < timestamps < strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(s)) if parse_timestamp(s).is_some() => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (parse_timestamp(x), parse_timestamp(y)) {
                (Some(tx), Some(ty)) => tx.cmp(&ty),
                (None, None) => x.cmp(y),
                _ => rank(a).cmp(&rank(b)),
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next write fail with `message`, as a rejected request would.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.state().fail_next_write = Some(message.into());
    }

    /// Insert or replace a document without server timestamps.
    pub fn put(&self, collection: &str, id: &str, data: Fields) {
        let mut state = self.state();
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), data);
        state.notify(collection);
    }

    /// Read a document synchronously.
    #[must_use]
    pub fn get(&self, collection: &str, id: &str) -> Option<Fields> {
        self.state().document(collection, id).map(|doc| doc.data)
    }

    /// Number of live subscriptions still attached.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state();
        state.queries.retain(|sub| !sub.sender.is_closed());
        state.documents.retain(|sub| !sub.sender.is_closed());
        state.queries.len() + state.documents.len()
    }

    fn issue_session(&self, uid: &str, email: &str, state: &mut State) -> AuthSession {
        let n = self.tokens.fetch_add(1, AtomicOrdering::Relaxed);
        let refresh = format!("memory-refresh-{uid}-{n}");
        state.refresh_tokens.insert(refresh.clone(), uid.to_owned());
        AuthSession {
            uid: uid.to_owned(),
            email: email.to_owned(),
            id_token: SecretString::from(format!("memory-id-{uid}-{n}")),
            refresh_token: SecretString::from(refresh),
            expires_at: Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECS),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    fn subscribe(&self, collection: &str, query: Query) -> LiveQuery<Snapshot> {
        let (sender, live) = live_channel();
        let mut state = self.state();
        sender.publish(state.run_query(collection, &query));
        state.queries.push(QuerySubscriber {
            collection: collection.to_owned(),
            query,
            sender,
        });
        live
    }

    fn subscribe_document(&self, collection: &str, id: &str) -> LiveQuery<Option<Document>> {
        let (sender, live) = live_channel();
        let mut state = self.state();
        sender.publish(state.document(collection, id));
        state.documents.push(DocumentSubscriber {
            collection: collection.to_owned(),
            id: id.to_owned(),
            sender,
        });
        live
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.state().document(collection, id))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Snapshot, StoreError> {
        Ok(self.state().run_query(collection, query))
    }

    async fn add(
        &self,
        collection: &str,
        mut data: Fields,
        server_timestamps: &[&str],
    ) -> Result<String, StoreError> {
        let mut state = self.state();
        state.take_failure()?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        for field in server_timestamps {
            data.insert((*field).to_owned(), Value::String(now.clone()));
        }

        let id = auto_id();
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), data);
        state.notify(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, data: Fields) -> Result<(), StoreError> {
        let mut state = self.state();
        state.take_failure()?;

        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;
        existing.extend(data);
        state.notify(collection);
        Ok(())
    }

    async fn set_merge(&self, collection: &str, id: &str, data: Fields) -> Result<(), StoreError> {
        let mut state = self.state();
        state.take_failure()?;

        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default()
            .extend(data);
        state.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.take_failure()?;

        if let Some(docs) = state.collections.get_mut(collection) {
            docs.remove(id);
        }
        state.notify(collection);
        Ok(())
    }

    fn with_token(&self, _id_token: &SecretString) -> Arc<dyn DocumentStore> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let mut state = self.state();
        let uid = match state.accounts.get(&email.trim().to_lowercase()) {
            Some(account) if account.password == password.expose_secret() => account.uid.clone(),
            _ => return Err(AuthError::Rejected("INVALID_LOGIN_CREDENTIALS".to_owned())),
        };
        Ok(self.issue_session(&uid, email, &mut state))
    }

    async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let key = email.trim().to_lowercase();
        if key.is_empty() || !key.contains('@') {
            return Err(AuthError::Rejected("INVALID_EMAIL".to_owned()));
        }
        if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(
                "WEAK_PASSWORD : Password should be at least 6 characters".to_owned(),
            ));
        }

        let mut state = self.state();
        if state.accounts.contains_key(&key) {
            return Err(AuthError::Rejected("EMAIL_EXISTS".to_owned()));
        }

        let uid = auto_id();
        state.accounts.insert(
            key,
            Account {
                uid: uid.clone(),
                password: password.expose_secret().to_owned(),
            },
        );
        Ok(self.issue_session(&uid, email, &mut state))
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, AuthError> {
        let mut state = self.state();
        let uid = state
            .refresh_tokens
            .remove(refresh_token.expose_secret())
            .ok_or_else(|| AuthError::Rejected("INVALID_REFRESH_TOKEN".to_owned()))?;
        let session = self.issue_session(&uid, "", &mut state);
        Ok(RefreshedTokens {
            uid: session.uid,
            id_token: session.id_token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        let Value::Object(fields) = value else {
            panic!("test fields must be an object");
        };
        fields
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_server_timestamp() {
        let backend = MemoryBackend::new();
        let id = backend
            .add("orders", fields(json!({ "total": 220 })), &["createdAt"])
            .await
            .unwrap();

        let stored = backend.get("orders", &id).unwrap();
        assert_eq!(stored["total"], 220);
        let created = stored["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[tokio::test]
    async fn test_filtered_ordered_subscription_sees_writes() {
        let backend = MemoryBackend::new();
        backend.put(
            "orders",
            "old",
            fields(json!({ "userId": "u1", "createdAt": "2024-01-01T00:00:00Z" })),
        );
        backend.put(
            "orders",
            "other",
            fields(json!({ "userId": "u2", "createdAt": "2024-06-01T00:00:00Z" })),
        );

        let query = Query::all()
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending);
        let mut live = backend.subscribe("orders", query);
        let first = live.changed().await.unwrap();
        assert_eq!(first.len(), 1);

        backend
            .add("orders", fields(json!({ "userId": "u1" })), &["createdAt"])
            .await
            .unwrap();
        let second = live.changed().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.documents[1].id, "old");
    }

    #[tokio::test]
    async fn test_update_requires_existing_document() {
        let backend = MemoryBackend::new();
        let err = backend
            .update("orders", "missing", fields(json!({ "status": "cancelled" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(backend.get("orders", "missing").is_none());
    }

    #[tokio::test]
    async fn test_set_merge_keeps_other_fields() {
        let backend = MemoryBackend::new();
        backend.put(
            "shopControl",
            "status",
            fields(json!({ "isClosed": false, "nextOpenTime": "2024-05-02T03:30:00Z" })),
        );

        backend
            .set_merge("shopControl", "status", fields(json!({ "isClosed": true })))
            .await
            .unwrap();

        let stored = backend.get("shopControl", "status").unwrap();
        assert_eq!(stored["isClosed"], true);
        assert_eq!(stored["nextOpenTime"], "2024-05-02T03:30:00Z");
    }

    #[tokio::test]
    async fn test_document_subscription_tracks_create_and_delete() {
        let backend = MemoryBackend::new();
        let mut live = backend.subscribe_document("products", "p1");
        assert_eq!(live.changed().await, Some(None));

        backend.put("products", "p1", fields(json!({ "name": "Milk" })));
        let doc = live.changed().await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Milk");

        backend.delete("products", "p1").await.unwrap();
        assert_eq!(live.changed().await, Some(None));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_untouched() {
        let backend = MemoryBackend::new();
        backend.fail_next_write("Missing or insufficient permissions.");

        let err = backend
            .add("orders", fields(json!({ "total": 1 })), &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing or insufficient permissions.");
        assert!(backend.query("orders", &Query::all()).await.unwrap().is_empty());

        assert!(backend.add("orders", fields(json!({ "total": 1 })), &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_subscriptions_are_pruned() {
        let backend = MemoryBackend::new();
        let live = backend.subscribe("products", Query::all());
        assert_eq!(backend.subscriber_count(), 1);
        drop(live);
        assert_eq!(backend.subscriber_count(), 0);
    }

    #[test]
    fn test_value_ordering() {
        let missing = None;
        let early = json!("2024-01-01T00:00:00Z");
        let late = json!("2024-01-01T05:30:00+05:30");
        let later = json!("2024-02-01T00:00:00Z");

        assert_eq!(compare_values(missing, Some(&early)), Ordering::Less);
        assert_eq!(compare_values(Some(&early), Some(&late)), Ordering::Equal);
        assert_eq!(compare_values(Some(&late), Some(&later)), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
    }

    #[tokio::test]
    async fn test_auth_register_sign_in_and_errors() {
        let backend = MemoryBackend::new();
        let session = backend
            .register("asha@example.com", &secret("hunter22"))
            .await
            .unwrap();
        assert_eq!(session.email, "asha@example.com");

        let again = backend
            .register("Asha@example.com", &secret("hunter22"))
            .await
            .unwrap_err();
        assert_eq!(again.to_string(), "EMAIL_EXISTS");

        let weak = backend.register("b@example.com", &secret("123")).await.unwrap_err();
        assert!(weak.to_string().starts_with("WEAK_PASSWORD"));

        let bad = backend
            .sign_in("asha@example.com", &secret("wrong"))
            .await
            .unwrap_err();
        assert_eq!(bad.to_string(), "INVALID_LOGIN_CREDENTIALS");

        let signed_in = backend
            .sign_in("asha@example.com", &secret("hunter22"))
            .await
            .unwrap();
        assert_eq!(signed_in.uid, session.uid);

        let refreshed = backend.refresh(&signed_in.refresh_token).await.unwrap();
        assert_eq!(refreshed.uid, session.uid);
        assert!(backend.refresh(&signed_in.refresh_token).await.is_err());
    }
}
