//! Error types for live queries
//!
//! Two layers, as every subscription sees them:
//! - [`StoreError`]: the store rejected a step or failed a delivery channel.
//!   Mirrors Firestore status codes.
//! - [`LiveError`]: everything the binding layer can report, including
//!   store errors, local mapping failures and malformed descriptors.
//!
//! # Design
//! Uses thiserror for the definitions. Both enums are `Clone + PartialEq`
//! because they are stored inside published [`LiveState`](crate::LiveState)
//! values and compared in tests.

use thiserror::Error;

/// Top-level error type for the binding layer
///
/// Wraps [`StoreError`] and adds the failures that happen locally, before a
/// request reaches the store or after a snapshot came back from it.
///
/// # Example
/// ```
/// use firestore_live::{LiveError, StoreError};
///
/// let err: LiveError = StoreError::PermissionDenied.into();
/// assert!(matches!(err, LiveError::Store(StoreError::PermissionDenied)));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LiveError {
    /// The store rejected or failed the subscription
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot payload could not be turned into a record
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Descriptor named an operation with no store counterpart
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Operation arguments did not match what the operation expects
    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        /// Operation name as it appears in the call list
        operation: String,
        /// What was wrong with the arguments
        reason: String,
    },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Store errors
///
/// Maps Firestore error codes to Rust enum variants. Any [`Store`](crate::Store)
/// implementation reports its failures with these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// Permission denied
    #[error("Permission denied")]
    PermissionDenied,

    /// Resource exhausted (e.g., quota exceeded)
    #[error("Resource exhausted")]
    ResourceExhausted,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Requirements of the query are not met (e.g., missing index)
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Deadline exceeded
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation was aborted
    #[error("Operation aborted")]
    Aborted,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable
    #[error("Service unavailable")]
    Unavailable,

    /// Unauthenticated
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Unknown error with code
    #[error("Unknown store error: code {0}")]
    Unknown(i32),
}

impl StoreError {
    /// Create from a Firestore/gRPC status code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Cancelled,
            3 => Self::InvalidArgument(String::new()),
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition(String::new()),
            10 => Self::Aborted,
            13 => Self::Internal(String::new()),
            14 => Self::Unavailable,
            16 => Self::Unauthenticated,
            _ => Self::Unknown(code),
        }
    }
}

impl LiveError {
    /// Create a mapping error from a string
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Create an argument error for `operation`
    pub fn invalid_arguments(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if a caller could reasonably retry
    ///
    /// The binding layer never retries on its own; this is a hint for the
    /// code that renders the error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable)
                | Self::Store(StoreError::DeadlineExceeded)
                | Self::Store(StoreError::ResourceExhausted)
                | Self::Store(StoreError::Aborted)
        )
    }
}
