//! Reconciliation errors.

use brood_api::ApiError;
use brood_store::StoreError;
use thiserror::Error;

/// Why a reconciliation run failed.
///
/// Transient failures go back on the work queue with backoff. Permanent ones
/// are dropped until a watch event or resync enqueues the bird again.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The monotonic token generator could not produce a new token.
    #[error("failed to generate egg token: {0}")]
    TokenGeneration(String),

    /// The controller reference could not be set on a new egg.
    #[error(transparent)]
    Ownership(#[from] ApiError),
}

impl ReconcileError {
    /// True when a retry may succeed without anything else changing.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::TokenGeneration(_) => true,
            Self::Ownership(_) => false,
        }
    }
}
