//! Snapshot listener plumbing shared by every store
//!
//! A store opens a delivery channel when a handle is subscribed and hands back
//! a [`ListenerRegistration`]. The channel stays open, calling the callback
//! with each snapshot or error, until the registration is removed.

use crate::error::StoreError;
use crate::store::query_snapshot::Snapshot;
use std::fmt;

/// Callback invoked by a store for each delivery on a channel
pub type SnapshotCallback = Box<dyn FnMut(Result<Snapshot, StoreError>) + Send + 'static>;

/// Handle for removing a snapshot listener
///
/// Removing is idempotent: the close action runs at most once, whether through
/// [`remove`](Self::remove) or on drop.
pub struct ListenerRegistration {
    close: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ListenerRegistration {
    /// Registration that runs `close` when the listener is removed
    pub fn new<F>(close: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            close: Some(Box::new(close)),
        }
    }

    /// Registration with nothing to close
    pub fn noop() -> Self {
        Self { close: None }
    }

    /// Whether the channel is still open
    pub fn is_active(&self) -> bool {
        self.close.is_some()
    }

    /// Removes the listener and stops receiving updates
    pub fn remove(&mut self) {
        if let Some(close) = self.close.take() {
            close();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.is_active())
            .finish()
    }
}
