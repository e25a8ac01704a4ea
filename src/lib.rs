//! Firestore live queries for UI code
//!
//! Subscribes to a document store's snapshot listeners and turns every
//! delivery into UI state (`is_loading` / `data` / `error` / `snapshot`).
//!
//! - [`live`]: query descriptors and the subscription state machine
//! - [`components`]: provider, store injection and render-prop components
//! - [`store`]: the store abstraction and an in-process implementation
//!
//! # Example
//! ```
//! use firestore_live::{fire_query, FilterOp, FirestoreProvider, MemoryStore, Status};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.set_document("users/alice", json!({"name": "Alice", "role": "admin"})).unwrap();
//!
//! let provider = FirestoreProvider::with_store(store.clone());
//! let mut scope = provider.live_query();
//!
//! let state = fire_query()
//!     .collection("users")
//!     .where_field("role", FilterOp::Equal, "admin")
//!     .limit(5)
//!     .use_result(&mut scope);
//! assert_eq!(state.status(), Status::Resolved);
//!
//! store.set_document("users/bob", json!({"name": "Bob", "role": "admin"})).unwrap();
//! assert_eq!(scope.state().data.as_collection().unwrap().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod components;
pub mod live;
pub mod store;

// Re-exports for convenience
pub use error::{LiveError, StoreError};

pub use live::{
    fire_query, LiveData, LiveQuery, LiveState, Operation, QueryDescriptor, QueryMode, Record, Status,
};

pub use components::{
    with_firestore, CollectionProps, DocumentProps, Filter, FilterClause, FirestoreCollection,
    FirestoreDocument, FirestoreProps, FirestoreProvider, ProviderSettings, WithFirestore,
};

pub use store::{
    Direction, DocumentSnapshot, FilterOp, ListenerRegistration, MemoryStore, QuerySnapshot,
    Snapshot, Store, StoreHandle, StoreSettings, Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types_exist() {
        // Basic smoke test
        let _err: LiveError = StoreError::NotFound.into();
    }
}
