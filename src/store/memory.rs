//! In-process document store
//!
//! Keeps JSON documents keyed by slash-separated paths and serves live
//! listeners the way a Firestore client does: a new listener gets the current
//! snapshot right away, and every write re-delivers to the listeners watching
//! the written document or its parent collection.
//!
//! Path rules follow Firestore: collection paths have an odd number of
//! segments (`users`, `users/alice/posts`), document paths an even number
//! (`users/alice`).
//!
//! Writes may come from any thread. Each write bumps a store version, and a
//! listener never receives a snapshot older than the last one it was handed.
//!
//! Besides serving as a local store, it carries a few knobs for exercising
//! failure paths: [`MemoryStore::fail_listeners`] and
//! [`MemoryStore::reject_subscriptions`].

use super::document_snapshot::DocumentSnapshot;
use super::field_value::{Direction, FilterOp, Value};
use super::listener::{ListenerRegistration, SnapshotCallback};
use super::query_snapshot::{QuerySnapshot, Snapshot};
use super::settings::StoreSettings;
use super::{Store, StoreHandle};
use crate::error::StoreError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// In-process document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    documents: BTreeMap<String, Value>,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
    /// Bumped on every write
    version: u64,
    subscribe_count: usize,
    rejection: Option<StoreError>,
    settings: Option<StoreSettings>,
}

struct Listener {
    target: Target,
    callback: Arc<Mutex<Delivery>>,
}

/// A listener's callback and the store version it last received
struct Delivery {
    callback: SnapshotCallback,
    delivered: Option<u64>,
}

impl Delivery {
    fn new(callback: SnapshotCallback) -> Self {
        Self {
            callback,
            delivered: None,
        }
    }

    /// Deliver a snapshot taken at `version`, unless one at least as new already went out
    fn snapshot(&mut self, version: u64, snapshot: Snapshot) -> bool {
        if self.delivered.map_or(false, |delivered| version <= delivered) {
            return false;
        }
        self.delivered = Some(version);
        (self.callback)(Ok(snapshot));
        true
    }

    fn error(&mut self, version: u64, error: StoreError) {
        self.delivered = Some(self.delivered.map_or(version, |delivered| delivered.max(version)));
        (self.callback)(Err(error));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Root,
    Collection(QueryTarget),
    Document(String),
}

#[derive(Debug, Clone, PartialEq)]
struct QueryTarget {
    collection: String,
    filters: Vec<(String, FilterOp, Value)>,
    orders: Vec<(String, Direction)>,
    limit: Option<u32>,
}

impl QueryTarget {
    fn new(collection: String) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    fn is_refined(&self) -> bool {
        !self.filters.is_empty() || !self.orders.is_empty() || self.limit.is_some()
    }
}

/// Chainable reference into a [`MemoryStore`]
#[derive(Clone)]
pub struct MemoryHandle {
    store: MemoryStore,
    target: Target,
}

impl std::fmt::Debug for MemoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHandle")
            .field("target", &self.target)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Split a path into segments, rejecting empty ones
fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidArgument("path must not be empty".into()));
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(StoreError::InvalidArgument(format!(
            "path '{}' contains an empty segment",
            path
        )));
    }
    Ok(parts)
}

fn join(base: &str, path: &str) -> Result<String, StoreError> {
    let tail = segments(path)?.join("/");
    if base.is_empty() {
        Ok(tail)
    } else {
        Ok(format!("{}/{}", base, tail))
    }
}

fn collection_path(path: String) -> Result<String, StoreError> {
    if segments(&path)?.len() % 2 == 1 {
        Ok(path)
    } else {
        Err(StoreError::InvalidArgument(format!(
            "'{}' is not a collection path (odd number of segments expected)",
            path
        )))
    }
}

fn document_path(path: String) -> Result<String, StoreError> {
    if segments(&path)?.len() % 2 == 0 {
        Ok(path)
    } else {
        Err(StoreError::InvalidArgument(format!(
            "'{}' is not a document path (even number of segments expected)",
            path
        )))
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

fn id_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve a dotted field path (`address.city`) inside a document
fn field<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |value, key| value.as_object()?.get(key))
}

/// Cross-type rank used for ordering, lowest first
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values for sorting
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| cmp_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Comparison for filters: values of different types never compare
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if type_rank(a) != type_rank(b) {
        return None;
    }
    Some(cmp_values(a, b))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare(a, b) == Some(Ordering::Equal)
}

fn contains(list: &Value, needle: &Value) -> bool {
    list.as_array()
        .map(|items| items.iter().any(|item| values_equal(item, needle)))
        .unwrap_or(false)
}

fn matches_filter(document: &Value, path: &str, op: FilterOp, expected: &Value) -> bool {
    let Some(actual) = field(document, path) else {
        return false;
    };
    match op {
        FilterOp::Equal => values_equal(actual, expected),
        FilterOp::NotEqual => !actual.is_null() && !values_equal(actual, expected),
        FilterOp::LessThan => compare(actual, expected) == Some(Ordering::Less),
        FilterOp::LessThanOrEqual => {
            matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOp::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        FilterOp::GreaterThanOrEqual => {
            matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOp::ArrayContains => contains(actual, expected),
        FilterOp::ArrayContainsAny => expected
            .as_array()
            .map(|wanted| wanted.iter().any(|w| contains(actual, w)))
            .unwrap_or(false),
        FilterOp::In => contains(expected, actual),
        FilterOp::NotIn => !actual.is_null() && expected.is_array() && !contains(expected, actual),
    }
}

impl MemoryInner {
    fn run_query(&self, query: &QueryTarget) -> QuerySnapshot {
        let mut matched: Vec<(&String, &Value)> = self
            .documents
            .iter()
            .filter(|(path, _)| parent_of(path) == Some(query.collection.as_str()))
            .filter(|(_, doc)| {
                query
                    .filters
                    .iter()
                    .all(|(path, op, value)| matches_filter(doc, path, *op, value))
            })
            // Documents missing an ordered field are left out, as Firestore does
            .filter(|(_, doc)| query.orders.iter().all(|(path, _)| field(doc, path).is_some()))
            .collect();

        matched.sort_by(|(a_path, a), (b_path, b)| {
            query
                .orders
                .iter()
                .map(|(path, direction)| {
                    let ordering = match (field(a, path), field(b, path)) {
                        (Some(x), Some(y)) => cmp_values(x, y),
                        _ => Ordering::Equal,
                    };
                    match direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or_else(|| id_of(a_path).cmp(id_of(b_path)))
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }

        QuerySnapshot::new(
            matched
                .into_iter()
                .map(|(path, doc)| DocumentSnapshot::new(path.clone(), Some(doc.clone())))
                .collect(),
        )
    }

    fn snapshot(&self, target: &Target) -> Option<Snapshot> {
        match target {
            Target::Root => None,
            Target::Document(path) => Some(Snapshot::Document(DocumentSnapshot::new(
                path.clone(),
                self.documents.get(path).cloned(),
            ))),
            Target::Collection(query) => Some(Snapshot::Query(self.run_query(query))),
        }
    }
}

impl Target {
    fn watches(&self, document: &str) -> bool {
        match self {
            Target::Root => false,
            Target::Document(path) => path == document,
            Target::Collection(query) => parent_of(document) == Some(query.collection.as_str()),
        }
    }

    fn path(&self) -> &str {
        match self {
            Target::Root => "",
            Target::Document(path) => path,
            Target::Collection(query) => &query.collection,
        }
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        lock(&self.inner)
    }

    /// Set (create or overwrite) the document at `path`
    pub fn set_document(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = document_path(join("", path)?)?;
        {
            let mut inner = self.inner();
            inner.documents.insert(path.clone(), value);
            inner.version += 1;
        }
        self.notify(&path);
        Ok(())
    }

    /// Merge the top-level fields of `patch` into an existing document
    pub fn update_document(&self, path: &str, patch: Value) -> Result<(), StoreError> {
        let path = document_path(join("", path)?)?;
        {
            let mut inner = self.inner();
            let existing = inner.documents.get_mut(&path).ok_or(StoreError::NotFound)?;
            match (existing, patch) {
                (Value::Object(fields), Value::Object(patch)) => fields.extend(patch),
                _ => {
                    return Err(StoreError::InvalidArgument(
                        "update requires field maps on both sides".into(),
                    ))
                }
            }
            inner.version += 1;
        }
        self.notify(&path);
        Ok(())
    }

    /// Delete the document at `path`
    ///
    /// Deleting a missing document is not an error.
    pub fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        let path = document_path(join("", path)?)?;
        let removed = {
            let mut inner = self.inner();
            let removed = inner.documents.remove(&path).is_some();
            if removed {
                inner.version += 1;
            }
            removed
        };
        if removed {
            self.notify(&path);
        }
        Ok(())
    }

    /// Add a new document with an auto-generated ID to `collection`
    ///
    /// Returns the path of the new document.
    pub fn add_document(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        use rand::Rng;
        let collection = collection_path(join("", collection)?)?;
        let auto_id: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(20)
            .map(char::from)
            .collect();

        let path = format!("{}/{}", collection, auto_id);
        self.set_document(&path, value)?;
        Ok(path)
    }

    /// Current payload of the document at `path`
    pub fn get_document(&self, path: &str) -> Option<Value> {
        self.inner().documents.get(path.trim_matches('/')).cloned()
    }

    /// Deliver `error` to every open channel watching `path`
    ///
    /// Channels stay open, so a later write delivers a snapshot again.
    pub fn fail_listeners(&self, path: &str, error: StoreError) {
        let path = path.trim_matches('/');
        let (version, callbacks): (u64, Vec<_>) = {
            let inner = self.inner();
            let callbacks = inner
                .listeners
                .values()
                .filter(|listener| listener.target.path() == path)
                .map(|listener| Arc::clone(&listener.callback))
                .collect();
            (inner.version, callbacks)
        };

        tracing::debug!(path, listeners = callbacks.len(), %error, "failing listeners");
        for callback in callbacks {
            lock(&callback).error(version, error.clone());
        }
    }

    /// Make every following `subscribe` fail with `error` (None to stop)
    pub fn reject_subscriptions(&self, error: Option<StoreError>) {
        self.inner().rejection = error;
    }

    /// Number of open delivery channels
    pub fn listener_count(&self) -> usize {
        self.inner().listeners.len()
    }

    /// Number of channels ever opened
    pub fn subscribe_count(&self) -> usize {
        self.inner().subscribe_count
    }

    /// Settings last applied through [`Store::apply_settings`]
    pub fn applied_settings(&self) -> Option<StoreSettings> {
        self.inner().settings
    }

    /// Re-deliver to the listeners watching `document`
    ///
    /// Snapshots are computed under the lock and tagged with the store
    /// version; callbacks run after it is released.
    fn notify(&self, document: &str) {
        let (version, deliveries): (u64, Vec<_>) = {
            let inner = self.inner();
            let deliveries = inner
                .listeners
                .values()
                .filter(|listener| listener.target.watches(document))
                .filter_map(|listener| {
                    inner
                        .snapshot(&listener.target)
                        .map(|snapshot| (Arc::clone(&listener.callback), snapshot))
                })
                .collect();
            (inner.version, deliveries)
        };

        tracing::trace!(document, version, listeners = deliveries.len(), "notifying listeners");
        for (callback, snapshot) in deliveries {
            if !lock(&callback).snapshot(version, snapshot) {
                tracing::trace!(document, version, "skipped outdated snapshot");
            }
        }
    }

    fn remove_listener(inner: &Weak<Mutex<MemoryInner>>, id: u64) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        // Drop the callback outside the store lock
        let removed = lock(&inner).listeners.remove(&id);
        if removed.is_some() {
            tracing::debug!(listener = id, "listener removed");
        }
        drop(removed);
    }
}

impl Store for MemoryStore {
    type Handle = MemoryHandle;

    fn root(&self) -> MemoryHandle {
        MemoryHandle {
            store: self.clone(),
            target: Target::Root,
        }
    }

    fn apply_settings(&self, settings: &StoreSettings) -> Result<(), StoreError> {
        self.inner().settings = Some(*settings);
        Ok(())
    }
}

impl MemoryHandle {
    fn with_target(&self, target: Target) -> Self {
        Self {
            store: self.store.clone(),
            target,
        }
    }

    fn refine<F>(&self, step: &str, apply: F) -> Result<Self, StoreError>
    where
        F: FnOnce(&mut QueryTarget),
    {
        match &self.target {
            Target::Collection(query) => {
                let mut query = query.clone();
                apply(&mut query);
                Ok(self.with_target(Target::Collection(query)))
            }
            _ => Err(StoreError::InvalidArgument(format!(
                "{}() requires a collection or query",
                step
            ))),
        }
    }

    /// Path this handle points at (empty for the root)
    pub fn path(&self) -> &str {
        self.target.path()
    }

    /// Whether this handle points at a single document
    pub fn is_document(&self) -> bool {
        matches!(self.target, Target::Document(_))
    }
}

impl StoreHandle for MemoryHandle {
    fn collection(&self, path: &str) -> Result<Self, StoreError> {
        let full = match &self.target {
            Target::Root => join("", path)?,
            Target::Document(doc) => join(doc, path)?,
            Target::Collection(query) => {
                return Err(StoreError::InvalidArgument(format!(
                    "collection() is not available on collection '{}'",
                    query.collection
                )))
            }
        };
        Ok(self.with_target(Target::Collection(QueryTarget::new(collection_path(full)?))))
    }

    fn doc(&self, path: &str) -> Result<Self, StoreError> {
        let full = match &self.target {
            Target::Root => join("", path)?,
            Target::Collection(query) if !query.is_refined() => join(&query.collection, path)?,
            Target::Collection(query) => {
                return Err(StoreError::InvalidArgument(format!(
                    "doc() is not available on a filtered query of '{}'",
                    query.collection
                )))
            }
            Target::Document(doc) => {
                return Err(StoreError::InvalidArgument(format!(
                    "doc() is not available on document '{}'",
                    doc
                )))
            }
        };
        Ok(self.with_target(Target::Document(document_path(full)?)))
    }

    fn where_field(&self, field: &str, op: FilterOp, value: Value) -> Result<Self, StoreError> {
        if field.is_empty() {
            return Err(StoreError::InvalidArgument("field path must not be empty".into()));
        }
        self.refine("where", |query| query.filters.push((field.to_string(), op, value)))
    }

    fn order_by(&self, field: &str, direction: Direction) -> Result<Self, StoreError> {
        if field.is_empty() {
            return Err(StoreError::InvalidArgument("field path must not be empty".into()));
        }
        self.refine("orderBy", |query| query.orders.push((field.to_string(), direction)))
    }

    fn limit(&self, limit: u32) -> Result<Self, StoreError> {
        self.refine("limit", |query| query.limit = Some(limit))
    }

    fn subscribe(&self, callback: SnapshotCallback) -> Result<ListenerRegistration, StoreError> {
        let callback = Arc::new(Mutex::new(Delivery::new(callback)));
        let (id, version, initial) = {
            let mut inner = self.store.inner();
            if let Some(error) = inner.rejection.clone() {
                tracing::warn!(path = self.path(), %error, "subscription rejected");
                return Err(error);
            }
            let initial = inner.snapshot(&self.target).ok_or_else(|| {
                StoreError::InvalidArgument("cannot subscribe to the store root".into())
            })?;

            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.subscribe_count += 1;
            inner.listeners.insert(
                id,
                Listener {
                    target: self.target.clone(),
                    callback: Arc::clone(&callback),
                },
            );
            (id, inner.version, initial)
        };

        tracing::debug!(listener = id, path = self.path(), "listener added");
        lock(&callback).snapshot(version, initial);

        let inner = Arc::downgrade(&self.store.inner);
        Ok(ListenerRegistration::new(move || {
            MemoryStore::remove_listener(&inner, id)
        }))
    }
}
