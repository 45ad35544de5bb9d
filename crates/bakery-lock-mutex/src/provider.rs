//! Bakery lock provider implementation.

use std::sync::Arc;

use bakery_lock_core::error::{LockError, LockResult};
use bakery_lock_core::key::KeySpace;
use bakery_lock_core::traits::{MutexProvider, ObjectStorage};

use crate::backoff::Backoff;
use crate::lock::BakeryMutex;

/// Builder for bakery lock provider configuration.
pub struct BakeryLockProviderBuilder<S: ObjectStorage> {
    storage: Option<Arc<S>>,
    num_procs: Option<usize>,
    backoff: Backoff,
    key_prefix: String,
}

impl<S: ObjectStorage> BakeryLockProviderBuilder<S> {
    /// Creates a new builder with the default backoff and bare keys.
    pub fn new() -> Self {
        Self {
            storage: None,
            num_procs: None,
            backoff: Backoff::default(),
            key_prefix: String::new(),
        }
    }

    /// Sets the object store shared by all participants.
    pub fn storage(mut self, storage: Arc<S>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the fixed number of participants.
    pub fn num_procs(mut self, num_procs: usize) -> Self {
        self.num_procs = Some(num_procs);
        self
    }

    /// Sets the delay window between polls.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Places the lock's objects under `prefix`.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Builds the provider.
    ///
    /// # Errors
    ///
    /// Returns `LockError::InvalidConfig` if no storage or participant count
    /// was given, if the count is zero, or if the key prefix is malformed.
    pub fn build(self) -> LockResult<BakeryLockProvider<S>> {
        let storage = self
            .storage
            .ok_or_else(|| LockError::InvalidConfig("storage not specified".to_string()))?;
        let num_procs = self.num_procs.ok_or_else(|| {
            LockError::InvalidConfig("participant count not specified".to_string())
        })?;
        if num_procs == 0 {
            return Err(LockError::InvalidConfig(
                "participant count must be at least 1".to_string(),
            ));
        }
        let keys = KeySpace::new(&self.key_prefix)?;

        Ok(BakeryLockProvider {
            storage,
            num_procs,
            backoff: self.backoff,
            keys,
        })
    }
}

impl<S: ObjectStorage> Default for BakeryLockProviderBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for the bakery mutexes of one participant group.
///
/// Every mutex it creates shares the same storage handle, participant
/// count, key space and backoff window.
pub struct BakeryLockProvider<S: ObjectStorage> {
    storage: Arc<S>,
    num_procs: usize,
    backoff: Backoff,
    keys: KeySpace,
}

impl<S: ObjectStorage> BakeryLockProvider<S> {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> BakeryLockProviderBuilder<S> {
        BakeryLockProviderBuilder::new()
    }

    /// Creates a provider with bare keys and the default backoff.
    ///
    /// Convenience method for simple use cases.
    pub fn new(storage: Arc<S>, num_procs: usize) -> LockResult<Self> {
        Self::builder().storage(storage).num_procs(num_procs).build()
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }
}

impl<S: ObjectStorage> MutexProvider for BakeryLockProvider<S> {
    type Mutex = BakeryMutex<S>;

    fn num_procs(&self) -> usize {
        self.num_procs
    }

    fn create_mutex(&self, participant: usize) -> LockResult<Self::Mutex> {
        Ok(
            BakeryMutex::new(self.storage.clone(), participant, self.num_procs)?
                .with_backoff(self.backoff)
                .with_key_space(self.keys.clone()),
        )
    }
}
