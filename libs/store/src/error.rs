//! Store error types.

use brood_api::ObjectKey;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: ObjectKey },

    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: &'static str, key: ObjectKey },

    /// Optimistic concurrency check failed.
    #[error("conflict on {kind} '{key}': expected resource version {expected}, found {actual}")]
    Conflict {
        kind: &'static str,
        key: ObjectKey,
        expected: u64,
        actual: u64,
    },

    #[error("invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    #[error("index '{0}' is not registered")]
    IndexNotFound(String),

    #[error("index '{0}' is already registered")]
    IndexExists(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// True for failures a later attempt may not hit again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Cancelled | Self::DeadlineExceeded | Self::Unavailable(_)
        )
    }
}
