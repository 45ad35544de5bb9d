//! Convenience prelude for bakery lock types.

pub use crate::error::{LockError, LockResult, StoreError, StoreResult};
pub use crate::key::KeySpace;
pub use crate::storage::ObjectStorageExt;
pub use crate::traits::{DistributedMutex, MutexProvider, ObjectStorage};
