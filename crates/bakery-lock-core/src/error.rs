//! Error types for object storage and distributed lock operations.

use thiserror::Error;

/// Errors surfaced by an [`ObjectStorage`](crate::traits::ObjectStorage)
/// backend and the typed storage primitives built on top of it.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An object expected to hold a decimal integer holds something else.
    #[error("object '{key}' does not hold an integer: {value:?}")]
    Decode { key: String, value: String },

    /// The backend could not be configured (missing bucket, bad directory).
    #[error("invalid storage configuration: {0}")]
    Config(String),

    /// Transport or any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps any backend error.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    /// Returns true for the "no such key" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// `lock` on a held mutex or `unlock` on a free one.
    #[error("invalid lock state: {0}")]
    InvalidState(String),

    /// Participant id, participant count, backoff window or key prefix is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A ticket object holds something other than a decimal integer.
    #[error("object '{key}' does not hold an integer: {value:?}")]
    Decode { key: String, value: String },

    /// The object store could not be reached or rejected a request.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for LockError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Decode { key, value } => LockError::Decode { key, value },
            StoreError::Backend(e) => LockError::Transport(e),
            StoreError::Config(msg) => LockError::InvalidConfig(msg),
            // Only reachable when a write path reports a missing key.
            not_found @ StoreError::NotFound(_) => LockError::Transport(Box::new(not_found)),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
