//! Document component

use super::render::{QueryComponent, QueryProps};
use crate::live::{fire_query, QueryDescriptor};

/// Render-prop component listening to one document
pub type FirestoreDocument<S> = QueryComponent<S, DocumentProps>;

/// Props of [`FirestoreDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProps {
    /// Document path (e.g., "users/alice")
    pub path: String,
}

impl DocumentProps {
    /// Props for the document at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl QueryProps for DocumentProps {
    fn descriptor(&self) -> QueryDescriptor {
        fire_query().doc(self.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FirestoreProvider;
    use crate::live::{LiveData, Status};
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_document_component_lifecycle() {
        let store = MemoryStore::new();
        store.set_document("users/foobar", json!({"foo": "bar"})).unwrap();
        let provider = FirestoreProvider::with_store(store.clone());

        let component = FirestoreDocument::mount(&provider, DocumentProps::new("users/foobar"));
        let foo = component.render(|state| state.data.as_document().map(|r| r["foo"].clone()));
        assert_eq!(foo, Some(json!("bar")));

        store.update_document("users/foobar", json!({"foo": "baz"})).unwrap();
        assert_eq!(component.state().data.as_document().unwrap()["foo"], json!("baz"));

        drop(component);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_invalid_path_fails() {
        let provider = FirestoreProvider::with_store(MemoryStore::new());
        let component = FirestoreDocument::mount(&provider, DocumentProps::new("users"));
        let state = component.state();
        assert_eq!(state.status(), Status::Failed);
        assert_eq!(state.data, LiveData::Document(None));
    }
}
