//! Driver error type.

use bakery_lock_core::error::{LockError, StoreError};
use thiserror::Error;

/// Errors that abort the workload.
#[derive(Error, Debug)]
pub enum DriverError {
    /// An environment variable is missing a valid value.
    #[error("invalid driver configuration: {0}")]
    Config(String),

    /// The payload file could not be read.
    #[error("failed to read payload file '{path}': {source}")]
    Payload {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Taking or releasing the lock failed.
    #[error("participant {participant}: {source}")]
    Lock {
        participant: usize,
        #[source]
        source: LockError,
    },

    /// A storage request inside the critical section failed.
    #[error("participant {participant}: {source}")]
    Store {
        participant: usize,
        #[source]
        source: StoreError,
    },

    /// A participant task panicked or was cancelled.
    #[error("participant task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DriverError {
    /// The participant the error happened in, if any.
    pub fn participant(&self) -> Option<usize> {
        match self {
            Self::Lock { participant, .. } | Self::Store { participant, .. } => Some(*participant),
            _ => None,
        }
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
