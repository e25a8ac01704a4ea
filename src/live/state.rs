//! Subscription state published to the UI

use super::descriptor::QueryMode;
use super::mapping::LiveData;
use crate::error::LiveError;
use crate::store::Snapshot;
use serde::de::DeserializeOwned;

/// Where a subscription stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not enabled; no channel is open
    Disabled,
    /// Channel requested, nothing delivered yet
    Pending,
    /// Last delivery was a snapshot
    Resolved,
    /// Last delivery (or the subscription itself) failed
    Failed,
}

/// State of one live query, as handed to render code
///
/// At most one of `is_loading`, `error` and `snapshot` is set; none of them
/// means the query is disabled. `data` always derives from `snapshot` and is
/// the empty value of its mode otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    /// Waiting for the first delivery
    pub is_loading: bool,
    /// Mapped records
    pub data: LiveData,
    /// Last error, if the latest delivery failed
    pub error: Option<LiveError>,
    /// Raw snapshot of the latest successful delivery
    pub snapshot: Option<Snapshot>,
}

impl LiveState {
    /// Waiting for the store
    pub fn pending(mode: QueryMode) -> Self {
        Self {
            is_loading: true,
            data: LiveData::empty(mode),
            error: None,
            snapshot: None,
        }
    }

    /// Switched off
    pub fn disabled(mode: QueryMode) -> Self {
        Self {
            is_loading: false,
            data: LiveData::empty(mode),
            error: None,
            snapshot: None,
        }
    }

    /// Successful delivery
    pub fn resolved(snapshot: Snapshot, data: LiveData) -> Self {
        Self {
            is_loading: false,
            data,
            error: None,
            snapshot: Some(snapshot),
        }
    }

    /// Failed delivery
    pub fn failed(mode: QueryMode, error: LiveError) -> Self {
        Self {
            is_loading: false,
            data: LiveData::empty(mode),
            error: Some(error),
            snapshot: None,
        }
    }

    /// Status derived from the fields
    pub fn status(&self) -> Status {
        if self.is_loading {
            Status::Pending
        } else if self.error.is_some() {
            Status::Failed
        } else if self.snapshot.is_some() {
            Status::Resolved
        } else {
            Status::Disabled
        }
    }

    /// Deserialize `data` into a caller type
    ///
    /// # Example
    /// ```
    /// use firestore_live::{LiveData, LiveState, Snapshot};
    /// use firestore_live::store::DocumentSnapshot;
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct User {
    ///     id: String,
    ///     name: String,
    /// }
    ///
    /// let snapshot = DocumentSnapshot::new("users/alice", Some(json!({"name": "Alice"})));
    /// let data = firestore_live::live::map_snapshot(&Snapshot::Document(snapshot.clone())).unwrap();
    /// let state = LiveState::resolved(Snapshot::Document(snapshot), data);
    ///
    /// let user: Option<User> = state.data_as().unwrap();
    /// let user = user.unwrap();
    /// assert_eq!((user.id.as_str(), user.name.as_str()), ("alice", "Alice"));
    /// ```
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, LiveError> {
        let value = serde_json::to_value(&self.data)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentSnapshot, QuerySnapshot};
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_status_derivation() {
        assert_eq!(LiveState::pending(QueryMode::Collection).status(), Status::Pending);
        assert_eq!(LiveState::disabled(QueryMode::Document).status(), Status::Disabled);
        assert_eq!(
            LiveState::failed(QueryMode::Document, LiveError::mapping("x")).status(),
            Status::Failed
        );
        let snapshot = Snapshot::Query(QuerySnapshot::default());
        assert_eq!(
            LiveState::resolved(snapshot, LiveData::Collection(vec![])).status(),
            Status::Resolved
        );
    }

    #[test]
    fn test_empty_data_per_mode() {
        assert_eq!(LiveState::pending(QueryMode::Document).data, LiveData::Document(None));
        assert_eq!(
            LiveState::failed(QueryMode::Collection, LiveError::mapping("x")).data,
            LiveData::Collection(vec![])
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: String,
        name: String,
    }

    #[test]
    fn test_data_as_collection() {
        let snapshot = Snapshot::Query(QuerySnapshot::new(vec![DocumentSnapshot::new(
            "users/a",
            Some(json!({"name": "Ann"})),
        )]));
        let data = crate::live::mapping::map_snapshot(&snapshot).unwrap();
        let state = LiveState::resolved(snapshot, data);
        let users: Vec<User> = state.data_as().unwrap();
        assert_eq!(
            users,
            vec![User {
                id: "a".into(),
                name: "Ann".into()
            }]
        );
    }

    #[test]
    fn test_data_as_type_mismatch() {
        let state = LiveState::disabled(QueryMode::Collection);
        let result: Result<User, _> = state.data_as();
        assert!(matches!(result, Err(LiveError::Serialization(_))));
    }
}
