//! Live user list
//!
//! Mounts a collection component on the in-process store and prints every
//! state the render prop would see while a background task writes to the
//! collection.
//!
//! ```bash
//! RUST_LOG=firestore_live=debug cargo run --example live_users
//! ```

use firestore_live::{
    CollectionProps, FirestoreCollection, FirestoreProvider, LiveError, LiveState, MemoryStore,
    ProviderSettings, Status,
};
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn render(state: &LiveState) -> String {
    match state.status() {
        Status::Disabled => "(disabled)".to_string(),
        Status::Pending => "loading...".to_string(),
        Status::Failed => format!("error: {}", state.error.as_ref().map(ToString::to_string).unwrap_or_default()),
        Status::Resolved => {
            let names: Vec<_> = state
                .data
                .as_collection()
                .unwrap_or_default()
                .iter()
                .filter_map(|user| user.get("name").and_then(|name| name.as_str()))
                .collect();
            format!("users: [{}]", names.join(", "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), LiveError> {
    // Default to INFO, override with RUST_LOG
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    let store = MemoryStore::new();
    store.set_document("users/alice", json!({"name": "Alice", "age": 34}))?;

    let provider = FirestoreProvider::new(
        store.clone(),
        ProviderSettings {
            timestamps_in_snapshots: Some(true),
        },
    )?;

    let props = CollectionProps::new("users").with_sort("name:asc")?.with_limit(10);
    let component = FirestoreCollection::mount(&provider, props);

    let writer = tokio::spawn(async move {
        for (id, name) in [("bob", "Bob"), ("carol", "Carol")] {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.set_document(&format!("users/{}", id), json!({"name": name}))?;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.delete_document("users/alice")?;
        Ok::<_, LiveError>(())
    });

    let mut updates = Box::pin(component.updates()).take(4);
    while let Some(state) = updates.next().await {
        tracing::info!("{}", render(&state));
    }

    writer
        .await
        .map_err(|error| LiveError::Mapping(format!("writer task failed: {}", error)))??;
    component.unmount();
    Ok(())
}
