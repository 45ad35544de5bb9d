//! Typed storage primitives layered on [`ObjectStorage`].
//!
//! These helpers translate the adapter's untyped byte objects into integer
//! and existence views and apply the "missing key means default" policy, so
//! lock code never inspects raw store errors. They add no coordination of
//! their own: every helper is one adapter call.

use std::future::Future;

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStorage;

/// Extension trait providing typed views over an [`ObjectStorage`].
pub trait ObjectStorageExt: ObjectStorage {
    /// Writes a zero-length object at `key`.
    fn put_empty(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send {
        self.put(key, Bytes::new())
    }

    /// Writes the decimal text encoding of `value` at `key`.
    fn put_int(&self, key: &str, value: u64) -> impl Future<Output = StoreResult<()>> + Send {
        self.put(key, Bytes::from(value.to_string()))
    }

    /// Reads the integer stored at `key`.
    ///
    /// Returns `default` if the key does not exist and
    /// `Err(StoreError::Decode)` if the payload is not a decimal integer.
    /// Any other failure is returned unchanged.
    fn get_int(
        &self,
        key: &str,
        default: u64,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        async move {
            match self.get(key).await {
                Ok(bytes) => decode_int(key, &bytes),
                Err(StoreError::NotFound(_)) => Ok(default),
                Err(e) => Err(e),
            }
        }
    }

    /// Returns true if an object exists at `key`.
    fn exists(&self, key: &str) -> impl Future<Output = StoreResult<bool>> + Send {
        async move {
            match self.get(key).await {
                Ok(_) => Ok(true),
                Err(StoreError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            }
        }
    }

    /// Removes the object at `key`, treating a missing key as success.
    fn remove(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send {
        async move {
            match self.delete(key).await {
                Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
                Err(e) => Err(e),
            }
        }
    }
}

// Blanket implementation for all ObjectStorage backends
impl<T: ObjectStorage + ?Sized> ObjectStorageExt for T {}

/// Parses a strictly decimal payload: no sign, padding or whitespace.
fn decode_int(key: &str, bytes: &[u8]) -> StoreResult<u64> {
    let malformed = || StoreError::Decode {
        key: key.to_string(),
        value: String::from_utf8_lossy(bytes).into_owned(),
    };

    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse::<u64>().ok())
        .ok_or_else(malformed)
}
