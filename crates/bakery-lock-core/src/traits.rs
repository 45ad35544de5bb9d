//! Core traits for object storage and distributed mutexes.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{LockResult, StoreResult};

// ============================================================================
// Object Storage Trait
// ============================================================================

/// A key-value object store with no ordering, transactional or
/// compare-and-swap guarantee across calls.
///
/// This is the only channel participants share. Implementations must report
/// a missing key on `get` as [`StoreError::NotFound`](crate::StoreError::NotFound)
/// so that callers can tell it apart from transport failures.
///
/// # Example
///
/// ```rust,ignore
/// storage.put("Entering_0", Bytes::new()).await?;
/// match storage.get("Entering_0").await {
///     Ok(_) => println!("present"),
///     Err(StoreError::NotFound(_)) => println!("absent"),
///     Err(e) => return Err(e),
/// }
/// ```
pub trait ObjectStorage: Send + Sync {
    /// Writes `value` at `key`, replacing any existing object.
    fn put(&self, key: &str, value: Bytes) -> impl Future<Output = StoreResult<()>> + Send;

    /// Reads the object at `key`.
    ///
    /// Returns `Err(StoreError::NotFound)` if no such object exists.
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Bytes>> + Send;

    /// Removes the object at `key`.
    ///
    /// Deleting a missing key may succeed or report `NotFound`; callers that
    /// need idempotent removal use [`ObjectStorageExt::remove`](crate::storage::ObjectStorageExt::remove).
    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Short backend name used in log fields.
    fn backend_name(&self) -> &'static str;
}

impl<S: ObjectStorage> ObjectStorage for Arc<S> {
    fn put(&self, key: &str, value: Bytes) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Bytes>> + Send {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).delete(key)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

// ============================================================================
// Distributed Mutex Trait
// ============================================================================

/// A mutual exclusion lock shared by a fixed set of participants that only
/// communicate through an [`ObjectStorage`].
///
/// Each participant owns one instance bound to its identity. The instance is
/// either unlocked (initial) or locked; `lock` is only valid while unlocked
/// and `unlock` only while locked. Both take `&mut self`, so a single
/// instance can never run two `lock` calls at once.
///
/// # Example
///
/// ```rust,ignore
/// mutex.lock().await?;
/// // Critical section - no other participant is locked
/// let seq = storage.get_int("NEXT", 0).await?;
/// storage.put_int("NEXT", seq + 1).await?;
/// mutex.unlock().await?;
/// ```
pub trait DistributedMutex: Send {
    /// Identity of the participant owning this instance, in `[0, num_procs)`.
    fn participant(&self) -> usize;

    /// Total number of participants sharing the lock.
    fn num_procs(&self) -> usize;

    /// Returns true between a successful `lock` and the matching `unlock`.
    fn is_locked(&self) -> bool;

    /// Blocks until this participant holds the lock.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Lock acquired
    /// * `Err(LockError::InvalidState)` - Already locked; storage untouched
    /// * `Err(LockError::Transport)` / `Err(LockError::Decode)` - Storage
    ///   failure; the instance stays unlocked
    ///
    /// There is no timeout. Wrap the future in `tokio::time::timeout` to
    /// bound the wait.
    fn lock(&mut self) -> impl Future<Output = LockResult<()>> + Send;

    /// Releases the lock.
    ///
    /// Fails with `LockError::InvalidState` if not locked. A storage failure
    /// leaves the instance locked so the caller may retry.
    fn unlock(&mut self) -> impl Future<Output = LockResult<()>> + Send;
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Factory for the per-participant mutex instances of one lock.
///
/// Providers encapsulate the storage handle and the shared configuration
/// (participant count, key space, retry policy) so that every participant
/// is created with identical settings.
///
/// # Example
///
/// ```rust,ignore
/// let provider = BakeryLockProvider::builder()
///     .storage(storage)
///     .num_procs(5)
///     .build()?;
///
/// let mut mutex = provider.create_mutex(2)?;
/// mutex.lock().await?;
/// ```
pub trait MutexProvider: Send + Sync {
    /// The mutex type created by this provider.
    type Mutex: DistributedMutex;

    /// Total number of participants.
    fn num_procs(&self) -> usize;

    /// Creates the mutex instance for `participant`.
    ///
    /// Fails with `LockError::InvalidConfig` if `participant >= num_procs()`.
    fn create_mutex(&self, participant: usize) -> LockResult<Self::Mutex>;
}
