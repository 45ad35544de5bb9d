//! In-process object store for tests, benchmarks and single-process simulations.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStorage;

/// Number of adapter calls served, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub puts: u64,
    pub gets: u64,
    pub deletes: u64,
}

impl OperationCounts {
    /// Calls that modify the store.
    pub fn writes(&self) -> u64 {
        self.puts + self.deletes
    }

    pub fn total(&self) -> u64 {
        self.puts + self.gets + self.deletes
    }
}

/// A linearizable map-backed [`ObjectStorage`].
///
/// Participants simulated as tasks in one process share it through an
/// `Arc`. Deleting a missing key reports `NotFound`, like some real
/// backends do.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    puts: AtomicU64,
    gets: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        // A panic while holding the guard cannot leave the map half-updated.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the stored bytes without counting an operation.
    pub fn raw(&self, key: &str) -> Option<Bytes> {
        self.objects().get(key).cloned()
    }

    /// Returns true if `key` exists, without counting an operation.
    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    /// Sorted copy of every object.
    pub fn snapshot(&self) -> BTreeMap<String, Bytes> {
        self.objects()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Sorted keys starting with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn operations(&self) -> OperationCounts {
        OperationCounts {
            puts: self.puts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }
}

impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.objects()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match self.objects().remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
