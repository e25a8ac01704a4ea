//! Snapshot to data mapping
//!
//! Every document becomes one flat [`Record`]: its id merged with its fields.

use super::descriptor::QueryMode;
use crate::error::LiveError;
use crate::store::{DocumentSnapshot, Snapshot, Value};
use serde::Serialize;

/// Flat record: `id` plus the document's fields
///
/// A field literally named `id` replaces the document id.
pub type Record = serde_json::Map<String, Value>;

/// Materialized view of the latest snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiveData {
    /// Document mode: one record, or nothing yet
    Document(Option<Record>),
    /// Collection mode: records in store order
    Collection(Vec<Record>),
}

impl LiveData {
    /// Empty value for `mode`: no record, or an empty list
    pub fn empty(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Document => LiveData::Document(None),
            QueryMode::Collection => LiveData::Collection(Vec::new()),
        }
    }

    /// Mode this data belongs to
    pub fn mode(&self) -> QueryMode {
        match self {
            LiveData::Document(_) => QueryMode::Document,
            LiveData::Collection(_) => QueryMode::Collection,
        }
    }

    /// Whether this is the empty value of its mode
    pub fn is_empty(&self) -> bool {
        match self {
            LiveData::Document(record) => record.is_none(),
            LiveData::Collection(records) => records.is_empty(),
        }
    }

    /// The record, in document mode
    pub fn as_document(&self) -> Option<&Record> {
        match self {
            LiveData::Document(record) => record.as_ref(),
            LiveData::Collection(_) => None,
        }
    }

    /// The records, in collection mode
    pub fn as_collection(&self) -> Option<&[Record]> {
        match self {
            LiveData::Document(_) => None,
            LiveData::Collection(records) => Some(records),
        }
    }
}

/// Map one document to its record
pub fn map_document(snapshot: &DocumentSnapshot) -> Result<Record, LiveError> {
    let mut record = Record::new();
    record.insert("id".to_string(), Value::from(snapshot.id()));
    if let Some(fields) = snapshot.data()? {
        record.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Ok(record)
}

/// Map a delivery to the data view
///
/// Query snapshots keep their document order.
pub fn map_snapshot(snapshot: &Snapshot) -> Result<LiveData, LiveError> {
    match snapshot {
        Snapshot::Document(document) => Ok(LiveData::Document(Some(map_document(document)?))),
        Snapshot::Query(query) => query
            .documents()
            .iter()
            .map(map_document)
            .collect::<Result<Vec<_>, _>>()
            .map(LiveData::Collection),
    }
}
