//! DocumentSnapshot and SnapshotMetadata types

use super::field_value::Value;
use crate::error::LiveError;
use serde_json::Map;

/// A single document as delivered by a store
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Full document path (e.g., "users/alice")
    pub path: String,

    /// Raw field payload (None if the document doesn't exist)
    ///
    /// Stores hand over whatever they hold; [`DocumentSnapshot::data`] checks
    /// that it is actually a field map.
    pub payload: Option<Value>,

    /// Document metadata
    pub metadata: SnapshotMetadata,
}

impl DocumentSnapshot {
    /// Create a snapshot for `path` carrying `payload`
    pub fn new(path: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            path: path.into(),
            payload,
            metadata: SnapshotMetadata::default(),
        }
    }

    /// Attach metadata to the snapshot
    pub fn with_metadata(mut self, metadata: SnapshotMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Get document ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.payload.is_some()
    }

    /// Field payload of the document
    ///
    /// Returns `Ok(None)` for a missing document and an error when the stored
    /// payload is not a field map.
    pub fn data(&self) -> Result<Option<&Map<String, Value>>, LiveError> {
        match &self.payload {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(fields)),
            Some(other) => Err(LiveError::mapping(format!(
                "document '{}' payload is not a field map: {}",
                self.path, other
            ))),
        }
    }

    /// Get a top-level field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        match &self.payload {
            Some(Value::Object(fields)) => fields.get(field),
            _ => None,
        }
    }
}

/// Metadata about a document snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotMetadata {
    /// Whether the snapshot contains pending writes
    pub has_pending_writes: bool,

    /// Whether the data came from cache
    pub is_from_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_snapshot_id_is_last_segment() {
        let snapshot = DocumentSnapshot::new("users/alice/posts/p1", None);
        assert_eq!(snapshot.id(), "p1");
        assert!(!snapshot.exists());
    }

    #[test]
    fn test_document_snapshot_data_map() {
        let snapshot = DocumentSnapshot::new("users/alice", Some(json!({"name": "Alice"})));
        let data = snapshot.data().unwrap().unwrap();
        assert_eq!(data.get("name"), Some(&json!("Alice")));
        assert_eq!(snapshot.get("name"), Some(&json!("Alice")));
    }

    #[test]
    fn test_document_snapshot_data_rejects_non_map() {
        let snapshot = DocumentSnapshot::new("users/alice", Some(json!([1, 2, 3])));
        let err = snapshot.data().unwrap_err();
        assert!(matches!(err, LiveError::Mapping(_)));
        assert!(snapshot.get("name").is_none());
    }

    #[test]
    fn test_document_snapshot_metadata_default() {
        let metadata = SnapshotMetadata::default();
        assert!(!metadata.has_pending_writes);
        assert!(!metadata.is_from_cache);
    }

    #[test]
    fn test_document_snapshot_with_metadata() {
        let snapshot = DocumentSnapshot::new("users/alice", Some(json!({}))).with_metadata(SnapshotMetadata {
            has_pending_writes: true,
            is_from_cache: false,
        });
        assert!(snapshot.metadata.has_pending_writes);
        assert!(!snapshot.metadata.is_from_cache);
    }
}
