//! Error types for schema-level operations.

use thiserror::Error;

/// Errors raised while manipulating object metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The owner has no uid, i.e. it was never persisted.
    #[error("{kind} '{name}' has no uid; owners must be persisted first")]
    OwnerWithoutUid { kind: &'static str, name: String },

    /// Owner and dependent live in different namespaces.
    #[error("cross-namespace owner references are not allowed: owner in '{owner_namespace}', object in '{object_namespace}'")]
    CrossNamespaceOwner {
        owner_namespace: String,
        object_namespace: String,
    },

    /// Another object is already the controller.
    #[error("object '{object}' is already controlled by {kind} '{name}'")]
    AlreadyOwned {
        object: String,
        kind: String,
        name: String,
    },
}
