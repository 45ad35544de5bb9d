//! Core traits, storage primitives and error types for bakery locks.

pub mod error;
pub mod key;
pub mod memory;
pub mod prelude;
pub mod storage;
pub mod traits;

pub use error::{LockError, LockResult, StoreError, StoreResult};
pub use key::KeySpace;
pub use memory::{MemoryStorage, OperationCounts};
pub use prelude::*;
