//! Polling loop behind Firestore live queries.
//!
//! The REST API has no push channel, so each subscription re-runs its read
//! on an interval and publishes only snapshots that differ from the last
//! one. Failed reads keep the last snapshot and back off exponentially.

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;
use crate::live::LiveSender;

/// Tuning for live-query polling.
///
/// ```
/// use std::time::Duration;
/// use zypso_firebase::PollConfig;
///
/// let config = PollConfig {
///     interval: Duration::from_millis(500),
///     ..PollConfig::default()
/// };
/// assert_eq!(config.max_backoff, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between successful reads.
    ///
    /// Default: 2 seconds.
    pub interval: Duration,

    /// Delay after the first failed read. Doubles on each further failure,
    /// up to [`max_backoff`](PollConfig::max_backoff). A successful read
    /// resets it.
    ///
    /// Default: 1 second.
    pub base_backoff: Duration,

    /// Maximum delay between failed reads.
    ///
    /// Default: 30 seconds.
    pub max_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    /// Delay before retrying after `failures` consecutive failed reads.
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }
}

/// Run `fetch` until every subscriber has gone, publishing each new result.
pub(crate) async fn run_poll_loop<S, F, Fut>(
    label: String,
    config: PollConfig,
    sender: LiveSender<S>,
    mut fetch: F,
) where
    S: PartialEq,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, StoreError>>,
{
    let mut failures: u32 = 0;

    loop {
        if sender.is_closed() {
            break;
        }

        let delay = match fetch().await {
            Ok(snapshot) => {
                if failures > 0 {
                    tracing::info!(query = %label, failures, "live query: recovered");
                }
                failures = 0;
                if sender.publish(snapshot) {
                    tracing::debug!(query = %label, "live query: snapshot changed");
                }
                config.interval
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = config.backoff(failures);
                tracing::warn!(
                    query = %label,
                    error = %e,
                    failures,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "live query: read failed, keeping last snapshot"
                );
                delay
            }
        };

        tokio::select! {
            () = sender.closed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!(query = %label, "live query: unsubscribed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::live::live_channel;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = PollConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
        assert_eq!(config.backoff(6), Duration::from_secs(30));
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_publishes_changes_and_survives_errors() {
        let (sender, mut live) = live_channel::<u32>();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let task = tokio::spawn(run_poll_loop(
            "test".to_owned(),
            PollConfig::default(),
            sender,
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 | 1 => Ok(10),
                        2 => Err(StoreError::InvalidDocument("boom".to_owned())),
                        _ => Ok(20),
                    }
                }
            },
        ));

        assert_eq!(live.changed().await, Some(10));
        assert_eq!(live.changed().await, Some(20));
        assert!(calls.load(Ordering::SeqCst) >= 4);

        drop(live);
        task.await.unwrap();
    }
}
