//! Display session.
//!
//! A [`MessageSession`] owns the full record sequence and the filter
//! inputs. Appends and filter changes go through its command queue and are
//! applied one at a time; each change publishes a new [`FilteredView`] on a
//! watch channel. [`load_inbox`] reads the inbox in the background and feeds
//! the session and, optionally, the sync outbox.

mod actor;
mod loader;
mod state;

pub use actor::{MessageSession, SessionHandle};
pub use loader::load_inbox;
pub use state::{FilteredView, MessageState};
