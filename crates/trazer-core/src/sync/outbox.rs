//! Outbound sync queue with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::DocumentStore;
use crate::message::{MessageId, MessageRecord};

/// Default collection messages are written to.
pub const DEFAULT_COLLECTION: &str = "messages";

/// Capacity of the sync event channel.
const EVENT_CAPACITY: usize = 256;

/// How failed writes are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per record, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry.
    #[must_use]
    pub const fn best_effort() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay after the given failed attempt (1-based), doubling each time.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Outcome notifications published by the outbox worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The record was written.
    Synced {
        /// Record key.
        id: MessageId,
        /// Attempts it took.
        attempts: u32,
    },
    /// A write failed and will be tried again.
    Retrying {
        /// Record key.
        id: MessageId,
        /// Attempt that just failed.
        attempt: u32,
        /// Delay before the next attempt.
        delay: Duration,
        /// Failure description.
        error: String,
    },
    /// The record was given up on.
    Failed {
        /// Record key.
        id: MessageId,
        /// Attempts made.
        attempts: u32,
        /// Last failure description.
        error: String,
    },
}

/// Totals reported when the outbox is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records written.
    pub synced: usize,
    /// Records given up on.
    pub failed: usize,
}

/// Cloneable handle for queueing records.
#[derive(Debug, Clone)]
pub struct OutboxSender {
    jobs: mpsc::UnboundedSender<MessageRecord>,
}

impl OutboxSender {
    /// Queue a record for upsert without waiting for the write.
    ///
    /// Returns `false` if the worker has stopped.
    pub fn enqueue(&self, record: MessageRecord) -> bool {
        self.jobs.send(record).is_ok()
    }
}

/// Background upsert queue in front of a [`DocumentStore`].
///
/// A single worker drains the queue in order, so two writes for the same
/// key land in the order they were queued. Failures never reach the
/// producer; they are retried per [`RetryPolicy`] and reported as
/// [`SyncEvent`]s.
pub struct SyncOutbox {
    sender: OutboxSender,
    events: broadcast::Sender<SyncEvent>,
    worker: JoinHandle<SyncStats>,
}

impl SyncOutbox {
    /// Start the worker on the current tokio runtime.
    pub fn spawn<S>(store: Arc<S>, collection: impl Into<String>, policy: RetryPolicy) -> Self
    where
        S: DocumentStore + 'static,
    {
        let (jobs, queue) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let worker = tokio::spawn(run_worker(
            store,
            collection.into(),
            policy,
            queue,
            events.clone(),
        ));

        Self {
            sender: OutboxSender { jobs },
            events,
            worker,
        }
    }

    /// Queue a record for upsert without waiting for the write.
    pub fn enqueue(&self, record: MessageRecord) -> bool {
        self.sender.enqueue(record)
    }

    /// Handle for queueing from other tasks.
    #[must_use]
    pub fn sender(&self) -> OutboxSender {
        self.sender.clone()
    }

    /// Subscribe to sync outcomes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Stop accepting work, drain the queue and return the totals.
    ///
    /// Waits until every cloned [`OutboxSender`] has been dropped.
    pub async fn close(self) -> SyncStats {
        drop(self.sender);
        match self.worker.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Sync worker ended abnormally: {e}");
                SyncStats::default()
            }
        }
    }
}

async fn run_worker<S>(
    store: Arc<S>,
    collection: String,
    policy: RetryPolicy,
    mut queue: mpsc::UnboundedReceiver<MessageRecord>,
    events: broadcast::Sender<SyncEvent>,
) -> SyncStats
where
    S: DocumentStore,
{
    let mut stats = SyncStats::default();

    while let Some(record) = queue.recv().await {
        let event = sync_one(store.as_ref(), &collection, &policy, &record, &events).await;
        match &event {
            SyncEvent::Synced { .. } => stats.synced += 1,
            SyncEvent::Failed { id, error, .. } => {
                warn!(%id, %error, "Giving up on message sync");
                stats.failed += 1;
            }
            SyncEvent::Retrying { .. } => {}
        }
        let _ = events.send(event);
    }

    info!(synced = stats.synced, failed = stats.failed, "Sync outbox drained");
    stats
}

async fn sync_one<S>(
    store: &S,
    collection: &str,
    policy: &RetryPolicy,
    record: &MessageRecord,
    events: &broadcast::Sender<SyncEvent>,
) -> SyncEvent
where
    S: DocumentStore,
{
    let id = record.id.clone();
    let fields = match record.to_document() {
        Ok(fields) => fields,
        Err(e) => {
            return SyncEvent::Failed {
                id,
                attempts: 0,
                error: e.to_string(),
            };
        }
    };

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.set_merge(collection, id.as_str(), &fields).await {
            Ok(()) => {
                debug!(%id, attempt, "Synced message");
                return SyncEvent::Synced {
                    id,
                    attempts: attempt,
                };
            }
            Err(e) if attempt >= max_attempts => {
                return SyncEvent::Failed {
                    id,
                    attempts: attempt,
                    error: e.to_string(),
                };
            }
            Err(e) => {
                let delay = policy.backoff(attempt);
                debug!(%id, attempt, ?delay, "Message sync failed, retrying: {e}");
                let _ = events.send(SyncEvent::Retrying {
                    id: id.clone(),
                    attempt,
                    delay,
                    error: e.to_string(),
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
