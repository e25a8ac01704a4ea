//! UI binding surface
//!
//! - [`FirestoreProvider`]: holds the store and hands it out explicitly
//! - [`with_firestore`]: wraps a component so it receives the store as a prop
//! - [`FirestoreCollection`] / [`FirestoreDocument`]: render-prop components

pub mod collection;
pub mod document;
pub mod provider;
pub mod render;

pub use collection::{parse_sort, CollectionProps, Filter, FilterClause, FirestoreCollection};
pub use document::{DocumentProps, FirestoreDocument};
pub use provider::{with_firestore, FirestoreProps, FirestoreProvider, ProviderSettings, WithFirestore};
pub use render::{QueryComponent, QueryProps};
