//! Typed local state fed by live queries.
//!
//! A projection owns a background task that reads snapshots from a
//! [`LiveQuery`], decodes them wholesale and republishes the result
//! through its own watch channel. Views read the latest value without
//! waiting; SSE handlers and tests await changes. Dropping the projection
//! aborts the task, which drops the live query and ends the subscription.

use std::sync::Arc;

use futures::Stream;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::live::LiveQuery;
use crate::store::{Document, Snapshot};

/// The projection's task has stopped and no further updates will arrive.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("projection closed")]
pub struct ProjectionClosed;

/// Aborts the wrapped task when dropped.
#[derive(Debug)]
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A collection mirrored into a `Vec<T>`.
#[derive(Debug)]
pub struct Projection<T> {
    rx: watch::Receiver<Option<Arc<Vec<T>>>>,
    _task: AbortOnDrop,
}

impl<T> Projection<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Start projecting `live`. `label` names the collection in logs.
    #[must_use]
    pub fn spawn(label: &'static str, mut live: LiveQuery<Snapshot>) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            while let Some(snapshot) = live.changed().await {
                let records: Vec<T> = snapshot.decode_all(label);
                tracing::debug!(
                    collection = label,
                    documents = snapshot.len(),
                    decoded = records.len(),
                    "Projection updated"
                );
                tx.send_replace(Some(Arc::new(records)));
            }
            tracing::debug!(collection = label, "Projection source ended");
        });

        Self {
            rx,
            _task: AbortOnDrop(task),
        }
    }

    /// The latest records; empty until the first snapshot arrives.
    #[must_use]
    pub fn current(&self) -> Arc<Vec<T>> {
        self.rx.borrow().clone().unwrap_or_default()
    }

    /// Whether the first snapshot has arrived.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until the records satisfy `predicate`, returning them.
    ///
    /// # Errors
    ///
    /// Returns `ProjectionClosed` if the projection stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&[T]) -> bool,
    ) -> Result<Arc<Vec<T>>, ProjectionClosed> {
        let mut rx = self.rx.clone();
        let value = rx
            .wait_for(|records| records.as_ref().is_some_and(|r| predicate(r.as_slice())))
            .await
            .map_err(|_| ProjectionClosed)?;
        Ok(value.clone().unwrap_or_default())
    }

    /// Stream of records, starting with the current value once loaded.
    pub fn updates(&self) -> impl Stream<Item = Arc<Vec<T>>> + Unpin + use<T> {
        WatchStream::new(self.rx.clone()).filter_map(|records| records)
    }
}

/// Latest state of a mirrored document.
#[derive(Debug, Clone)]
struct MirrorState<T> {
    value: Option<T>,
    loaded: bool,
}

/// A single document mirrored into a `T`.
///
/// A missing or undecodable document leaves the last good value in place.
#[derive(Debug)]
pub struct DocumentMirror<T> {
    rx: watch::Receiver<MirrorState<T>>,
    _task: AbortOnDrop,
}

impl<T> DocumentMirror<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Start mirroring `live`. `label` names the document in logs.
    #[must_use]
    pub fn spawn(label: &'static str, mut live: LiveQuery<Option<Document>>) -> Self {
        let (tx, rx) = watch::channel(MirrorState {
            value: None,
            loaded: false,
        });
        let task = tokio::spawn(async move {
            while let Some(document) = live.changed().await {
                let decoded = document.as_ref().and_then(|doc| match doc.decode::<T>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(document = label, error = %e, "Ignoring undecodable document");
                        None
                    }
                });
                tx.send_modify(|state| {
                    state.loaded = true;
                    if decoded.is_some() {
                        state.value = decoded;
                    }
                });
            }
            tracing::debug!(document = label, "Mirror source ended");
        });

        Self {
            rx,
            _task: AbortOnDrop(task),
        }
    }

    /// The latest decoded value, if the document has ever existed.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.rx.borrow().value.clone()
    }

    /// Whether the first snapshot (present or not) has arrived.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.rx.borrow().loaded
    }

    /// Wait until the value satisfies `predicate`, returning it.
    ///
    /// # Errors
    ///
    /// Returns `ProjectionClosed` if the mirror stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&T) -> bool,
    ) -> Result<T, ProjectionClosed> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|state| state.value.as_ref().is_some_and(|v| predicate(v)))
            .await
            .map_err(|_| ProjectionClosed)?;
        state.value.clone().ok_or(ProjectionClosed)
    }

    /// Stream of values, starting with the current one once loaded.
    pub fn updates(&self) -> impl Stream<Item = Option<T>> + Unpin + use<T> {
        WatchStream::new(self.rx.clone()).filter_map(|state| state.loaded.then_some(state.value))
    }
}
