//! Background inbox load.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::actor::SessionHandle;
use crate::Result;
use crate::inbox::{InboxProvider, PermissionGate, ReadSummary, read_inbox};
use crate::sync::OutboxSender;

/// Read the inbox on a background task and feed the session.
///
/// Every parsed record is appended to the session and, when an outbox is
/// given, queued for remote sync. Queueing never waits for the write.
/// The task resolves to the [`ReadSummary`] of the read.
pub fn load_inbox<P, G>(
    provider: Arc<P>,
    gate: G,
    session: SessionHandle,
    outbox: Option<OutboxSender>,
) -> JoinHandle<Result<ReadSummary>>
where
    P: InboxProvider + Send + Sync + 'static,
    G: PermissionGate + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let summary = read_inbox(provider.as_ref(), &gate).await?;
        if summary.is_permission_denied() {
            return Ok(summary);
        }

        session.append(summary.records.clone())?;

        if let Some(outbox) = &outbox {
            let queued = summary
                .records
                .iter()
                .filter(|record| outbox.enqueue((*record).clone()))
                .count();
            if queued < summary.records.len() {
                warn!(
                    queued,
                    total = summary.records.len(),
                    "Sync outbox stopped, some records were not queued"
                );
            }
        }

        info!(
            records = summary.records.len(),
            skipped = summary.skipped_count(),
            "Loaded inbox"
        );
        Ok(summary)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filter::FilterCriteria;
    use crate::inbox::{FixedInbox, InboxRow, PermissionStatus, columns, full_row};
    use crate::session::MessageSession;
    use crate::sync::{MemoryDocumentStore, RetryPolicy, SyncOutbox};

    fn inbox() -> Arc<FixedInbox> {
        Arc::new(FixedInbox(vec![
            full_row("1", Some("555"), Some("hello world")),
            full_row("2", Some("999"), Some("goodbye")),
        ]))
    }

    #[tokio::test]
    async fn denied_permission_leaves_session_empty() {
        let handle = MessageSession::spawn(
            FilterCriteria::new().with_query("hello").with_sender("555"),
        );
        let summary = load_inbox(inbox(), PermissionStatus::Denied, handle.clone(), None)
            .await
            .unwrap()
            .unwrap();

        assert!(summary.is_permission_denied());
        assert!(summary.records.is_empty());
        let view = handle.snapshot().await.unwrap();
        assert!(view.is_empty());
        assert_eq!(view.total, 0);
    }

    #[tokio::test]
    async fn granted_read_reaches_session_and_outbox() {
        let store = Arc::new(MemoryDocumentStore::new());
        let outbox = SyncOutbox::spawn(store.clone(), "messages", RetryPolicy::default());
        let handle = MessageSession::spawn(FilterCriteria::new().with_query("o"));

        let summary = load_inbox(
            inbox(),
            PermissionStatus::Granted,
            handle.clone(),
            Some(outbox.sender()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(summary.records.len(), 2);

        let view = handle.snapshot().await.unwrap();
        assert_eq!(view.len(), 2);

        let stats = outbox.close().await;
        assert_eq!(stats.synced, 2);
        assert_eq!(store.len(), 2);
        assert!(store.get("messages", "1").is_some());
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() {
        let broken: InboxRow = full_row("3", None, None).with(columns::ID, None::<&str>);
        let provider = Arc::new(FixedInbox(vec![
            full_row("1", Some("555"), Some("hi")),
            broken,
        ]));
        let handle = MessageSession::spawn(FilterCriteria::new());

        let summary = load_inbox(provider, PermissionStatus::Granted, handle.clone(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(handle.snapshot().await.unwrap().len(), 1);
    }
}
