//! Document store abstraction
//!
//! The live-query layer never talks to a database directly. It drives a
//! [`Store`] through chainable [`StoreHandle`]s, the same way a Firestore client
//! builds `collection("users").where(..).limit(..)` before calling
//! `onSnapshot`.
//!
//! Module layout follows the client concepts:
//! - `field_value.rs` (Value, FilterOp, Direction)
//! - `document_snapshot.rs` / `query_snapshot.rs` (deliveries)
//! - `listener.rs` (callbacks and ListenerRegistration)
//! - `snapshot_stream.rs` (deliveries as a Stream)
//! - `settings.rs`
//! - `memory.rs` (in-process store)

pub mod document_snapshot;
pub mod field_value;
pub mod listener;
/// In-process store with live listeners
pub mod memory;
pub mod query_snapshot;
pub mod settings;
/// Stream adapter for snapshot listeners
pub mod snapshot_stream;

pub use document_snapshot::{DocumentSnapshot, SnapshotMetadata};
pub use field_value::{Direction, FilterOp, Value};
pub use listener::{ListenerRegistration, SnapshotCallback};
pub use memory::{MemoryHandle, MemoryStore};
pub use query_snapshot::{QuerySnapshot, Snapshot};
pub use settings::StoreSettings;
pub use snapshot_stream::{listen, SnapshotStream};

use crate::error::StoreError;

/// Entry point of a document store
///
/// Cheap to clone; clones share the same underlying client.
pub trait Store: Clone + Send + Sync + 'static {
    /// Chainable reference type produced by this store
    type Handle: StoreHandle;

    /// Handle every descriptor replay starts from
    fn root(&self) -> Self::Handle;

    /// Apply client settings
    ///
    /// Stores without configurable behavior accept and ignore them.
    fn apply_settings(&self, settings: &StoreSettings) -> Result<(), StoreError> {
        let _ = settings;
        Ok(())
    }
}

/// Immutable, chainable reference into a store
///
/// Each refinement returns a new handle; `self` is left untouched. A store
/// rejects steps that make no sense for the current handle (for example a
/// `where` on a single document) with a [`StoreError`].
pub trait StoreHandle: Clone + Send + Sync + 'static {
    /// Collection at `path`, relative to this handle
    fn collection(&self, path: &str) -> Result<Self, StoreError>;

    /// Document at `path`, relative to this handle
    fn doc(&self, path: &str) -> Result<Self, StoreError>;

    /// Keep documents whose `field` satisfies `op` against `value`
    fn where_field(&self, field: &str, op: FilterOp, value: Value) -> Result<Self, StoreError>;

    /// Order results by `field`
    fn order_by(&self, field: &str, direction: Direction) -> Result<Self, StoreError>;

    /// Return at most `limit` documents
    fn limit(&self, limit: u32) -> Result<Self, StoreError>;

    /// Open a delivery channel
    ///
    /// The callback may be called any number of times, from whatever context
    /// the store delivers on, until the returned registration is removed.
    fn subscribe(&self, callback: SnapshotCallback) -> Result<ListenerRegistration, StoreError>;
}
