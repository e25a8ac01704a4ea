//! QuerySnapshot and the Snapshot delivery type

use super::document_snapshot::DocumentSnapshot;

/// Query snapshot containing multiple documents
///
/// Documents keep the order the store delivered them in, which already
/// reflects every filter, sort and limit of the query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    pub(crate) documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    /// Create a snapshot from documents in store order
    pub fn new(documents: Vec<DocumentSnapshot>) -> Self {
        Self { documents }
    }

    /// All documents in store order
    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    /// Check if the query result is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get the number of documents in the snapshot
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

/// One delivery on a snapshot channel
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Delivery for a document handle
    Document(DocumentSnapshot),
    /// Delivery for a collection or query handle
    Query(QuerySnapshot),
}

impl Snapshot {
    /// Whether this delivery is for a single document
    pub fn is_document(&self) -> bool {
        matches!(self, Snapshot::Document(_))
    }
}

impl From<DocumentSnapshot> for Snapshot {
    fn from(snapshot: DocumentSnapshot) -> Self {
        Snapshot::Document(snapshot)
    }
}

impl From<QuerySnapshot> for Snapshot {
    fn from(snapshot: QuerySnapshot) -> Self {
        Snapshot::Query(snapshot)
    }
}
