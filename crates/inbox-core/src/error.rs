//! Error types for notification store operations

use crate::fs::FsError;
use thiserror::Error;

/// Errors surfaced by the notification store
#[derive(Error, Debug)]
pub enum Error {
    /// Operation requires an authenticated (non-zero) caller
    #[error("permission denied: authenticated user required")]
    PermissionDenied,

    /// Caller cancelled the operation before it completed
    #[error("operation cancelled")]
    Cancelled,

    /// A stored record could not be encoded or decoded
    #[error("encoding error in {path}: {source}")]
    Encoding {
        path: String,
        source: serde_json::Error,
    },

    /// Underlying hierarchical store failure
    #[error(transparent)]
    Store(FsError),

    /// Repository identifier cannot be used as a store path
    #[error("invalid repository {repo:?}: {reason}")]
    InvalidRepo { repo: String, reason: String },

    /// User spec string is not of the form `{id}@{domain}`
    #[error("invalid user spec {spec:?}: {reason}")]
    InvalidUserSpec { spec: String, reason: String },

    /// Notification key does not decode to a thread reference
    #[error("invalid notification key {key:?}")]
    InvalidKey { key: String },
}

impl From<FsError> for Error {
    fn from(err: FsError) -> Self {
        match err {
            FsError::Cancelled => Error::Cancelled,
            other => Error::Store(other),
        }
    }
}

/// Result alias for store operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
