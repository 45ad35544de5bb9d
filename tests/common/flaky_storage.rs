//! Storage wrapper that fails chosen requests, for exercising error paths.

use std::sync::Mutex;

use bakery_lock_core::error::{StoreError, StoreResult};
use bakery_lock_core::memory::MemoryStorage;
use bakery_lock_core::traits::ObjectStorage;
use bytes::Bytes;

/// Adapter request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Get,
    Delete,
}

/// [`MemoryStorage`] that answers selected `(operation, key)` pairs with a
/// transport error until [`heal`](FlakyStorage::heal) is called.
pub struct FlakyStorage {
    inner: MemoryStorage,
    failures: Mutex<Vec<(Op, String)>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    /// Makes every `op` on `key` fail from now on.
    pub fn fail(&self, op: Op, key: &str) {
        self.failures.lock().unwrap().push((op, key.to_string()));
    }

    /// Stops injecting failures.
    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
    }

    fn check(&self, op: Op, key: &str) -> StoreResult<()> {
        let failures = self.failures.lock().unwrap();
        if failures.iter().any(|(o, k)| *o == op && k == key) {
            return Err(StoreError::backend(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("injected {op:?} failure on {key}"),
            )));
        }
        Ok(())
    }
}

impl ObjectStorage for FlakyStorage {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.check(Op::Put, key)?;
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.check(Op::Get, key)?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check(Op::Delete, key)?;
        self.inner.delete(key).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
