//! Snapshot listener as an async stream.
//!
//! Wraps a callback channel into a `futures::Stream`. The stream owns the
//! [`ListenerRegistration`], so dropping it removes the listener (RAII
//! instead of an explicit `remove()` call).
//!
//! # Example
//! ```
//! use firestore_live::store::{listen, MemoryStore, Store, StoreHandle};
//! use futures::StreamExt;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.set_document("cities/SF", json!({"name": "San Francisco"}))?;
//!
//! let handle = store.root().doc("cities/SF")?;
//! let mut stream = listen(&handle)?;
//! if let Some(Ok(snapshot)) = stream.next().await {
//!     assert!(snapshot.is_document());
//! }
//! // Listener removed on drop
//! # Ok(())
//! # }
//! ```

use crate::error::StoreError;
use crate::store::listener::ListenerRegistration;
use crate::store::query_snapshot::Snapshot;
use crate::store::StoreHandle;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A stream of snapshot updates for one handle.
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
    registration: ListenerRegistration,
}

impl SnapshotStream {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
        registration: ListenerRegistration,
    ) -> Self {
        Self {
            receiver,
            registration,
        }
    }

    /// Removes the listener without dropping the stream
    ///
    /// Deliveries already queued can still be read.
    pub fn close(&mut self) {
        self.registration.remove();
    }
}

impl Stream for SnapshotStream {
    type Item = Result<Snapshot, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Subscribe to `handle` and receive deliveries as a stream
pub fn listen<H: StoreHandle>(handle: &H) -> Result<SnapshotStream, StoreError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let registration = handle.subscribe(Box::new(move |delivery| {
        // Receiver gone means the stream was dropped; nothing to do
        let _ = tx.send(delivery);
    }))?;
    Ok(SnapshotStream::new(rx, registration))
}
