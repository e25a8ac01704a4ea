//! Live query scope: the activation state machine
//!
//! A [`LiveQuery`] owns at most one delivery channel. Every evaluation pass
//! hands it the current descriptor and enabled flag:
//!
//! - same descriptor (by value) and flag as before: nothing happens
//! - anything else: the open channel is closed, then a new one is opened
//!   (or none, when disabled)
//!
//! Deliveries are mapped into a [`LiveState`] and published through a
//! `tokio::sync::watch` channel, so render code can either read the current
//! state or await changes.
//!
//! # Example
//! ```
//! use firestore_live::{fire_query, LiveQuery, MemoryStore, Status};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.set_document("users/foobar", json!({"foo": "bar"})).unwrap();
//!
//! let mut scope = LiveQuery::new(store.clone());
//! let state = fire_query().collection("users").doc("foobar").use_result(&mut scope);
//!
//! assert_eq!(state.status(), Status::Resolved);
//! assert_eq!(state.data.as_document().unwrap()["foo"], json!("bar"));
//!
//! drop(scope);
//! assert_eq!(store.listener_count(), 0);
//! ```

use super::descriptor::{QueryDescriptor, QueryMode};
use super::dispatch::replay;
use super::mapping::map_snapshot;
use super::state::LiveState;
use crate::error::LiveError;
use crate::store::{ListenerRegistration, SnapshotCallback, Store, StoreHandle};
use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// State shared between the scope and its delivery callback
struct Shared {
    /// Bumped on every teardown; deliveries tagged with an older value are dropped
    generation: AtomicU64,
    state: watch::Sender<LiveState>,
}

impl Shared {
    /// Publish `next` unless the channel it came from was closed meanwhile
    ///
    /// The generation check runs under the watch lock, as does the bump in
    /// [`Shared::invalidate`], so a stale delivery can never overwrite a newer
    /// state.
    fn publish_if_current(&self, generation: u64, next: LiveState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        })
    }

    fn invalidate(&self) -> u64 {
        let mut current = 0;
        self.state.send_if_modified(|_| {
            current = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            false
        });
        current
    }

    fn publish(&self, next: LiveState) {
        self.state.send_replace(next);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveKey {
    descriptor: QueryDescriptor,
    enabled: bool,
}

/// One live subscription scope
///
/// Drop it (or call [`close`](Self::close)) when the consumer goes away; the
/// open channel, if any, is closed exactly once.
pub struct LiveQuery<S: Store> {
    store: S,
    shared: Arc<Shared>,
    active: Option<ActiveKey>,
    registration: Option<ListenerRegistration>,
}

impl<S: Store> LiveQuery<S> {
    /// Scope bound to `store`; starts disabled with no channel
    pub fn new(store: S) -> Self {
        let (state, _) = watch::channel(LiveState::disabled(QueryMode::Collection));
        Self {
            store,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                state,
            }),
            active: None,
            registration: None,
        }
    }

    /// Store this scope subscribes against
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one evaluation pass and return the resulting state
    ///
    /// Re-evaluating with an equal descriptor and flag is a no-op. Otherwise
    /// the previous channel is closed before anything new is opened.
    pub fn use_result(&mut self, descriptor: &QueryDescriptor, enabled: bool) -> LiveState {
        let key = ActiveKey {
            descriptor: descriptor.clone(),
            enabled,
        };
        if self.active.as_ref() == Some(&key) {
            return self.state();
        }

        let generation = self.teardown();
        self.active = Some(key);
        let mode = descriptor.mode();

        if !enabled {
            tracing::debug!(%descriptor, "live query disabled");
            self.shared.publish(LiveState::disabled(mode));
            return self.state();
        }

        self.shared.publish(LiveState::pending(mode));
        let callback = deliver(Arc::clone(&self.shared), generation, mode);
        let subscribed = replay(self.store.root(), descriptor).and_then(|handle| handle.subscribe(callback));

        match subscribed {
            Ok(registration) => {
                tracing::debug!(%descriptor, generation, "live query subscribed");
                self.registration = Some(registration);
            }
            Err(error) => {
                tracing::warn!(%descriptor, %error, "live query could not subscribe");
                self.shared
                    .publish_if_current(generation, LiveState::failed(mode, error.into()));
            }
        }
        self.state()
    }

    /// Current state
    pub fn state(&self) -> LiveState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<LiveState> {
        self.shared.state.subscribe()
    }

    /// Stream of states: the current one, then each change
    ///
    /// Intermediate states may be skipped if the consumer falls behind; the
    /// latest one is always seen. The stream ends when the scope is dropped.
    pub fn updates(&self) -> impl Stream<Item = LiveState> + Send + 'static {
        let mut receiver = self.shared.state.subscribe();
        async_stream::stream! {
            let current = receiver.borrow_and_update().clone();
            yield current;
            while receiver.changed().await.is_ok() {
                let next = receiver.borrow_and_update().clone();
                yield next;
            }
        }
    }

    /// Whether a delivery channel is open
    pub fn is_subscribed(&self) -> bool {
        self.registration.is_some()
    }

    /// Close the open channel, if any
    ///
    /// The next [`use_result`](Self::use_result) subscribes again, even for
    /// the same descriptor.
    pub fn close(&mut self) {
        self.teardown();
        self.active = None;
    }

    /// Invalidate in-flight deliveries and close the channel
    fn teardown(&mut self) -> u64 {
        let generation = self.shared.invalidate();
        if let Some(mut registration) = self.registration.take() {
            registration.remove();
            if let Some(active) = &self.active {
                tracing::debug!(descriptor = %active.descriptor, "live query closed");
            }
        }
        generation
    }
}

impl<S: Store> Drop for LiveQuery<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Callback that maps deliveries for one channel generation
fn deliver(shared: Arc<Shared>, generation: u64, mode: QueryMode) -> SnapshotCallback {
    Box::new(move |delivery| {
        let next = match delivery {
            Ok(snapshot) => match map_snapshot(&snapshot) {
                Ok(data) => LiveState::resolved(snapshot, data),
                Err(error) => {
                    tracing::warn!(%error, "snapshot could not be mapped");
                    LiveState::failed(mode, error)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "snapshot delivery failed");
                LiveState::failed(mode, LiveError::from(error))
            }
        };
        if !shared.publish_if_current(generation, next) {
            tracing::trace!(generation, "dropped delivery from closed channel");
        }
    })
}

impl QueryDescriptor {
    /// Evaluate this descriptor in `scope`, enabled
    pub fn use_result<S: Store>(&self, scope: &mut LiveQuery<S>) -> LiveState {
        scope.use_result(self, true)
    }

    /// Evaluate this descriptor in `scope`, subscribing only if `enabled`
    pub fn use_result_if<S: Store>(&self, scope: &mut LiveQuery<S>, enabled: bool) -> LiveState {
        scope.use_result(self, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::live::descriptor::fire_query;
    use crate::live::mapping::LiveData;
    use crate::live::state::Status;
    use crate::store::{FilterOp, MemoryStore};
    use futures::StreamExt;
    use serde_json::json;

    fn store_with_users() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set_document("users/foobar", json!({"name": "foo", "role": "admin"}))
            .unwrap();
        store
            .set_document("users/barfoo", json!({"name": "bar", "role": "admin"}))
            .unwrap();
        store
    }

    fn names(state: &LiveState) -> Vec<String> {
        state
            .data
            .as_collection()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_new_scope_is_disabled() {
        let scope = LiveQuery::new(MemoryStore::new());
        assert_eq!(scope.state().status(), Status::Disabled);
        assert!(!scope.is_subscribed());
    }

    #[test]
    fn test_same_descriptor_subscribes_once() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());

        for _ in 0..3 {
            // Fresh descriptor on every pass
            let q = fire_query().collection("users");
            q.use_result(&mut scope);
        }

        assert_eq!(store.subscribe_count(), 1);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_changed_descriptor_closes_before_reopening() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());

        fire_query().collection("users").use_result(&mut scope);
        let state = fire_query().collection("users").limit(1).use_result(&mut scope);

        assert_eq!(store.subscribe_count(), 2);
        assert_eq!(store.listener_count(), 1);
        assert_eq!(names(&state), vec!["bar"]);
    }

    #[test]
    fn test_disabled_never_subscribes() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());

        let state = fire_query().collection("users").doc("foobar").use_result_if(&mut scope, false);
        assert_eq!(state.status(), Status::Disabled);
        assert_eq!(state.data, LiveData::Document(None));
        assert_eq!(store.subscribe_count(), 0);
    }

    #[test]
    fn test_disabling_closes_open_channel() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());
        let q = fire_query().collection("users");

        q.use_result(&mut scope);
        let state = q.use_result_if(&mut scope, false);

        assert_eq!(store.listener_count(), 0);
        assert_eq!(state.data, LiveData::Collection(vec![]));
        assert!(!scope.is_subscribed());
    }

    #[test]
    fn test_error_then_recovery() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());
        let q = fire_query()
            .collection("users")
            .where_field("role", FilterOp::Equal, "admin");

        assert_eq!(names(&q.use_result(&mut scope)), vec!["bar", "foo"]);

        store.fail_listeners("users", StoreError::PermissionDenied);
        let state = scope.state();
        assert_eq!(state.status(), Status::Failed);
        assert_eq!(state.error, Some(LiveError::Store(StoreError::PermissionDenied)));
        assert_eq!(state.data, LiveData::Collection(vec![]));
        assert!(state.snapshot.is_none());

        store.set_document("users/baz", json!({"name": "baz", "role": "admin"})).unwrap();
        let state = scope.state();
        assert_eq!(state.status(), Status::Resolved);
        assert!(state.error.is_none());
        assert_eq!(names(&state), vec!["bar", "baz", "foo"]);
    }

    #[test]
    fn test_rejected_chain_fails_locally() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());

        let state = fire_query()
            .collection("users")
            .doc("foobar")
            .limit(1)
            .use_result(&mut scope);

        assert_eq!(state.status(), Status::Failed);
        assert!(matches!(
            state.error,
            Some(LiveError::Store(StoreError::InvalidArgument(_)))
        ));
        assert_eq!(state.data, LiveData::Document(None));
        assert!(!scope.is_subscribed());
    }

    #[test]
    fn test_mapping_error_surfaces_as_failure() {
        let store = MemoryStore::new();
        store.set_document("config/app", json!("plain string")).unwrap();
        let mut scope = LiveQuery::new(store);

        let state = fire_query().doc("config/app").use_result(&mut scope);
        assert_eq!(state.status(), Status::Failed);
        assert!(matches!(state.error, Some(LiveError::Mapping(_))));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_close_is_idempotent() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());
        fire_query().collection("users").use_result(&mut scope);

        scope.close();
        scope.close();
        assert_eq!(store.listener_count(), 0);

        // Scope reopens after close even for the same descriptor
        fire_query().collection("users").use_result(&mut scope);
        assert_eq!(store.subscribe_count(), 2);
    }

    #[test]
    fn test_stale_delivery_is_ignored() {
        let shared = Arc::new(Shared {
            generation: AtomicU64::new(0),
            state: watch::channel(LiveState::disabled(QueryMode::Collection)).0,
        });
        let mut old = deliver(Arc::clone(&shared), 0, QueryMode::Collection);
        let current = shared.invalidate();
        assert_eq!(current, 1);

        old(Err(StoreError::Unavailable));
        assert_eq!(shared.state.borrow().status(), Status::Disabled);
    }

    #[tokio::test]
    async fn test_updates_stream_follows_deliveries() {
        let store = store_with_users();
        let mut scope = LiveQuery::new(store.clone());
        fire_query().collection("users").use_result(&mut scope);

        let mut updates = Box::pin(scope.updates());
        let first = updates.next().await.unwrap();
        assert_eq!(names(&first), vec!["bar", "foo"]);

        store.delete_document("users/barfoo").unwrap();
        let second = updates.next().await.unwrap();
        assert_eq!(names(&second), vec!["foo"]);

        drop(scope);
        assert!(updates.next().await.is_none());
    }
}
