//! Live query handles.
//!
//! A [`LiveQuery`] is the receiving end of a subscription: a cancellable
//! handle over a lazy, possibly endless sequence of full snapshots. The
//! producing side ([`LiveSender`]) belongs to whichever backend runs the
//! subscription. Dropping every handle closes the channel, which the
//! producer observes through [`LiveSender::closed`] and stops.

use futures::Stream;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

/// Create a connected sender/handle pair with no snapshot yet.
#[must_use]
pub fn live_channel<S>() -> (LiveSender<S>, LiveQuery<S>) {
    let (tx, rx) = watch::channel(None);
    (LiveSender { tx }, LiveQuery::new(rx))
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct LiveQuery<S> {
    rx: watch::Receiver<Option<S>>,
}

impl<S> LiveQuery<S> {
    fn new(mut rx: watch::Receiver<Option<S>>) -> Self {
        // The first `changed()` yields whatever is already there.
        rx.mark_changed();
        Self { rx }
    }
}

impl<S: Clone> LiveQuery<S> {
    /// The latest snapshot, if one has arrived.
    #[must_use]
    pub fn current(&self) -> Option<S> {
        self.rx.borrow().clone()
    }

    /// Wait for a snapshot not yet seen through this handle.
    ///
    /// Returns `None` once the subscription has ended.
    pub async fn changed(&mut self) -> Option<S> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(snapshot) = self.rx.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// Consume the handle as a stream of snapshots, starting with the
    /// current one when present.
    pub fn into_stream(self) -> impl Stream<Item = S> + Unpin
    where
        S: Send + Sync + 'static,
    {
        WatchStream::new(self.rx).filter_map(|snapshot| snapshot)
    }

    /// Stop the subscription.
    pub fn cancel(self) {
        drop(self);
    }
}

/// Producing end of a subscription.
#[derive(Debug)]
pub struct LiveSender<S> {
    tx: watch::Sender<Option<S>>,
}

impl<S: PartialEq> LiveSender<S> {
    /// Publish a snapshot if it differs from the last one.
    ///
    /// Returns `true` when subscribers were notified.
    pub fn publish(&self, snapshot: S) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&snapshot) {
                false
            } else {
                *current = Some(snapshot);
                true
            }
        })
    }
}

impl<S> LiveSender<S> {
    /// Whether every handle has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once every handle has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}
