//! Component tests against the in-process store
//!
//! Run with: cargo test --test components

use firestore_live::{
    with_firestore, CollectionProps, DocumentProps, Filter, FirestoreCollection, FirestoreDocument,
    FirestoreProvider, LiveError, MemoryStore, ProviderSettings, Status, StoreError, StoreSettings,
    WithFirestore,
};
use futures::StreamExt;
use serde_json::json;

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set_document("users/foobar", json!({"foo": "bar"})).unwrap();
    store.set_document("users/barfoo", json!({"foo": "baz"})).unwrap();
    store
}

#[test]
fn test_provider_render_prop_exposes_store() {
    let store = seeded_store();
    let provider = FirestoreProvider::with_store(store.clone());

    let value = provider.render(|props| props.firestore.get_document("users/foobar"));
    assert_eq!(value, Some(json!({"foo": "bar"})));
}

#[test]
fn test_provider_applies_explicit_settings() {
    let store = MemoryStore::new();
    let provider = FirestoreProvider::new(
        store.clone(),
        ProviderSettings {
            timestamps_in_snapshots: Some(true),
        },
    )
    .unwrap();

    assert_eq!(provider.settings().timestamps_in_snapshots, Some(true));
    assert_eq!(
        store.applied_settings(),
        Some(StoreSettings::with_timestamps_in_snapshots(true))
    );
}

#[test]
fn test_with_firestore_passes_props_through() {
    let provider = FirestoreProvider::with_store(seeded_store());
    let component = with_firestore(
        &provider,
        |WithFirestore { firestore, props }: WithFirestore<MemoryStore, (String, u32)>| {
            let exists = firestore.get_document("users/foobar").is_some();
            (props.0, props.1, exists)
        },
    );

    assert_eq!(component(("test".to_string(), 1)), ("test".to_string(), 1, true));
}

#[test]
fn test_document_component_sees_live_changes() {
    let store = seeded_store();
    let provider = FirestoreProvider::with_store(store.clone());
    let component = FirestoreDocument::mount(&provider, DocumentProps::new("users/foobar"));

    let record = component.render(|state| state.data.as_document().cloned()).unwrap();
    assert_eq!(record["id"], json!("foobar"));
    assert_eq!(record["foo"], json!("bar"));

    store.delete_document("users/foobar").unwrap();
    let state = component.state();
    assert_eq!(state.status(), Status::Resolved);
    let record = state.data.as_document().unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(record["id"], json!("foobar"));
}

#[test]
fn test_collection_component_with_filter_sort_and_limit() {
    let store = MemoryStore::new();
    for (id, name, age) in [("a", "Ann", 41), ("b", "Ben", 19), ("c", "Cid", 33), ("d", "Dee", 27)] {
        store
            .set_document(&format!("people/{}", id), json!({"name": name, "age": age}))
            .unwrap();
    }
    let provider = FirestoreProvider::with_store(store.clone());

    let props = CollectionProps::new("people")
        .with_filter(Filter::from_value(&json!(["age", ">", 20])).unwrap())
        .with_sort("age:desc")
        .unwrap()
        .with_limit(2);
    let component = FirestoreCollection::mount(&provider, props);

    let names: Vec<_> = component.render(|state| {
        state
            .data
            .as_collection()
            .unwrap()
            .iter()
            .map(|record| record["name"].clone())
            .collect()
    });
    assert_eq!(names, vec![json!("Ann"), json!("Cid")]);
}

#[test]
fn test_unmount_closes_channel() {
    let store = seeded_store();
    let provider = FirestoreProvider::with_store(store.clone());

    let first = FirestoreCollection::mount(&provider, CollectionProps::new("users"));
    let second = FirestoreDocument::mount(&provider, DocumentProps::new("users/barfoo"));
    assert_eq!(store.listener_count(), 2);

    first.unmount();
    assert_eq!(store.listener_count(), 1);
    drop(second);
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn test_listener_error_reaches_render_prop() {
    let store = seeded_store();
    let provider = FirestoreProvider::with_store(store.clone());
    let component = FirestoreCollection::mount(&provider, CollectionProps::new("users"));

    store.fail_listeners("users", StoreError::Unauthenticated);
    let error = component.render(|state| state.error.clone());
    assert_eq!(error, Some(LiveError::Store(StoreError::Unauthenticated)));
}

#[tokio::test]
async fn test_component_updates_stream() {
    let store = seeded_store();
    let provider = FirestoreProvider::with_store(store.clone());
    let component = FirestoreCollection::mount(&provider, CollectionProps::new("users"));

    let mut updates = Box::pin(component.updates());
    let first = updates.next().await.unwrap();
    assert_eq!(first.data.as_collection().unwrap().len(), 2);

    let path = store.add_document("users", json!({"foo": "new"})).unwrap();
    let id = path.rsplit('/').next().unwrap().to_string();
    let next = updates.next().await.unwrap();
    let records = next.data.as_collection().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().any(|record| record["id"] == json!(id)));

    component.unmount();
    assert!(updates.next().await.is_none());
}
