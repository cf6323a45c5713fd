//! Session task serializing appends and filter changes.

use std::sync::Arc;

use regex::Regex;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

use super::state::{FilteredView, MessageState};
use crate::filter::FilterCriteria;
use crate::message::MessageRecord;
use crate::{Error, Result};

enum Command {
    Append(Vec<MessageRecord>),
    SetQuery(String),
    SetSender(String),
    SetPattern(Option<Regex>),
    SetCriteria(FilterCriteria),
    Snapshot(oneshot::Sender<Arc<FilteredView>>),
}

/// Task owning a [`MessageState`].
///
/// Commands are applied one at a time in the order they were sent. After
/// each command that changes the state, a fresh [`FilteredView`] is
/// published to every subscriber. The task ends when the last
/// [`SessionHandle`] is dropped.
pub struct MessageSession {
    state: MessageState,
    commands: mpsc::UnboundedReceiver<Command>,
    view: watch::Sender<Arc<FilteredView>>,
}

impl MessageSession {
    /// Start a session filtered by `criteria` and return its handle.
    #[must_use]
    pub fn spawn(criteria: FilterCriteria) -> SessionHandle {
        let mut state = MessageState::new(criteria);
        let (view_tx, view_rx) = watch::channel(Arc::new(state.view()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let session = Self {
            state,
            commands: commands_rx,
            view: view_tx,
        };
        tokio::spawn(session.run());

        SessionHandle {
            commands: commands_tx,
            view: view_rx,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            if let Command::Snapshot(reply) = command {
                let _ = reply.send(self.view.borrow().clone());
                continue;
            }
            if self.apply(command) {
                self.publish();
            }
        }
        debug!(
            records = self.state.records().len(),
            "Message session closed"
        );
    }

    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Append(records) => {
                let count = records.len();
                let changed = self.state.append(records);
                trace!(count, revision = self.state.revision(), "Appended records");
                changed
            }
            Command::SetQuery(query) => self.state.set_query(query),
            Command::SetSender(sender) => self.state.set_sender(sender),
            Command::SetPattern(pattern) => self.state.set_pattern(pattern),
            Command::SetCriteria(criteria) => self.state.set_criteria(criteria),
            Command::Snapshot(_) => false,
        }
    }

    fn publish(&mut self) {
        let view = Arc::new(self.state.view());
        self.view.send_replace(view);
    }
}

/// Cloneable handle to a running [`MessageSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<Arc<FilteredView>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append(records) => write!(f, "Append({})", records.len()),
            Self::SetQuery(query) => write!(f, "SetQuery({query:?})"),
            Self::SetSender(sender) => write!(f, "SetSender({sender:?})"),
            Self::SetPattern(pattern) => {
                write!(f, "SetPattern({:?})", pattern.as_ref().map(Regex::as_str))
            }
            Self::SetCriteria(criteria) => write!(f, "SetCriteria({criteria:?})"),
            Self::Snapshot(_) => write!(f, "Snapshot"),
        }
    }
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::SessionClosed)
    }

    /// Append records to the full sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub fn append(&self, records: Vec<MessageRecord>) -> Result<()> {
        self.send(Command::Append(records))
    }

    /// Change the free-text query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub fn set_query(&self, query: impl Into<String>) -> Result<()> {
        self.send(Command::SetQuery(query.into()))
    }

    /// Change the sender filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub fn set_sender(&self, sender: impl Into<String>) -> Result<()> {
        self.send(Command::SetSender(sender.into()))
    }

    /// Change the body pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub fn set_pattern(&self, pattern: Option<Regex>) -> Result<()> {
        self.send(Command::SetPattern(pattern))
    }

    /// Replace every filter input at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub fn set_criteria(&self, criteria: FilterCriteria) -> Result<()> {
        self.send(Command::SetCriteria(criteria))
    }

    /// Observe the filtered view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<FilteredView>> {
        self.view.clone()
    }

    /// Most recently published view.
    #[must_use]
    pub fn current(&self) -> Arc<FilteredView> {
        self.view.borrow().clone()
    }

    /// View after every command sent so far has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has stopped.
    pub async fn snapshot(&self) -> Result<Arc<FilteredView>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| Error::SessionClosed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Vec<MessageRecord> {
        vec![
            MessageRecord::new("1")
                .with_address("555")
                .with_body("hello world"),
            MessageRecord::new("2")
                .with_address("999")
                .with_body("goodbye"),
        ]
    }

    #[tokio::test]
    async fn starts_with_an_empty_view() {
        let handle = MessageSession::spawn(FilterCriteria::new().with_query("x"));
        let view = handle.current();
        assert!(view.is_empty());
        assert_eq!(view.total, 0);
        assert_eq!(view.criteria.query, "x");
    }

    #[tokio::test]
    async fn subscribers_see_appends_and_filter_changes() {
        let handle = MessageSession::spawn(FilterCriteria::new());
        let mut rx = handle.subscribe();

        handle.append(sample()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);

        handle.set_query("hello").unwrap();
        rx.changed().await.unwrap();
        let view = rx.borrow_and_update().clone();
        assert_eq!(view.len(), 1);
        assert_eq!(view.records[0].id.as_str(), "1");
        assert_eq!(view.total, 2);
    }

    #[tokio::test]
    async fn commands_apply_in_order() {
        let handle = MessageSession::spawn(FilterCriteria::new());
        handle.set_sender("555").unwrap();
        handle.append(sample()).unwrap();
        handle.set_sender("").unwrap();
        handle.set_query("bye").unwrap();

        let view = handle.snapshot().await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.records[0].id.as_str(), "2");
        assert_eq!(view.revision, 1);
    }

    #[tokio::test]
    async fn unchanged_input_publishes_nothing() {
        let handle = MessageSession::spawn(FilterCriteria::new().with_query("a"));
        let mut rx = handle.subscribe();
        let _ = rx.borrow_and_update();

        handle.set_query("a").unwrap();
        handle.snapshot().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn pattern_and_criteria_replace_inputs() {
        let handle = MessageSession::spawn(FilterCriteria::new());
        handle.append(sample()).unwrap();
        handle
            .set_pattern(FilterCriteria::compile_pattern("^good").unwrap())
            .unwrap();
        assert_eq!(handle.snapshot().await.unwrap().len(), 1);

        handle.set_criteria(FilterCriteria::new()).unwrap();
        assert_eq!(handle.snapshot().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn closed_session_is_reported() {
        let (commands, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let (_view_tx, view) = watch::channel(Arc::new(FilteredView::default()));
        let handle = SessionHandle { commands, view };

        assert!(matches!(handle.append(sample()), Err(Error::SessionClosed)));
        assert!(matches!(handle.snapshot().await, Err(Error::SessionClosed)));
    }
}
