//! Store injection
//!
//! The provider is handed explicitly to whatever needs the store. There is no
//! ambient context to look it up from.

use crate::error::LiveError;
use crate::live::{fire_query, LiveQuery, QueryDescriptor};
use crate::store::{Store, StoreSettings};

/// Settings a provider pushes to its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderSettings {
    /// Forwarded to the store only when set
    ///
    /// Default: None (store settings untouched)
    pub timestamps_in_snapshots: Option<bool>,
}

/// Root of a binding tree, holding the store
#[derive(Clone)]
pub struct FirestoreProvider<S: Store> {
    store: S,
    settings: ProviderSettings,
}

/// Arguments of the [`FirestoreProvider::render`] render prop
pub struct FirestoreProps<'a, S> {
    /// The injected store
    pub firestore: &'a S,
}

/// Props received by a component wrapped with [`with_firestore`]
#[derive(Debug, Clone)]
pub struct WithFirestore<S, P> {
    /// The injected store
    pub firestore: S,
    /// The caller's own props, passed through untouched
    pub props: P,
}

impl<S: Store> FirestoreProvider<S> {
    /// Provider for `store`, applying `settings` first
    ///
    /// Fails if the store rejects the settings.
    pub fn new(store: S, settings: ProviderSettings) -> Result<Self, LiveError> {
        if let Some(enabled) = settings.timestamps_in_snapshots {
            tracing::debug!(timestamps_in_snapshots = enabled, "applying store settings");
            store.apply_settings(&StoreSettings::with_timestamps_in_snapshots(enabled))?;
        }
        Ok(Self { store, settings })
    }

    /// Provider for `store` without touching its settings
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            settings: ProviderSettings::default(),
        }
    }

    /// The injected store
    pub fn firestore(&self) -> &S {
        &self.store
    }

    /// Settings the provider was built with
    pub fn settings(&self) -> ProviderSettings {
        self.settings
    }

    /// Render prop exposing the store
    pub fn render<R, F>(&self, render: F) -> R
    where
        F: FnOnce(FirestoreProps<'_, S>) -> R,
    {
        render(FirestoreProps {
            firestore: &self.store,
        })
    }

    /// Empty descriptor, ready to chain
    pub fn query(&self) -> QueryDescriptor {
        fire_query()
    }

    /// New subscription scope bound to this provider's store
    pub fn live_query(&self) -> LiveQuery<S> {
        LiveQuery::new(self.store.clone())
    }
}

/// Wrap `component` so it receives the provider's store next to its props
///
/// # Example
/// ```
/// use firestore_live::{with_firestore, FirestoreProvider, MemoryStore, WithFirestore};
///
/// let provider = FirestoreProvider::with_store(MemoryStore::new());
/// let greeting = with_firestore(&provider, |WithFirestore { firestore, props }: WithFirestore<MemoryStore, &'static str>| {
///     format!("{} ({} listeners)", props, firestore.listener_count())
/// });
///
/// assert_eq!(greeting("hello"), "hello (0 listeners)");
/// ```
pub fn with_firestore<S, P, R, C>(provider: &FirestoreProvider<S>, component: C) -> impl Fn(P) -> R
where
    S: Store,
    C: Fn(WithFirestore<S, P>) -> R,
{
    let store = provider.store.clone();
    move |props| {
        component(WithFirestore {
            firestore: store.clone(),
            props,
        })
    }
}
