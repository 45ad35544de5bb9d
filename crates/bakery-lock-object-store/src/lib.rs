//! `object_store` backend for bakery locks.
//!
//! [`ObjectStoreStorage`] implements
//! [`ObjectStorage`](bakery_lock_core::traits::ObjectStorage) over S3 (or
//! any S3-compatible endpoint), a local directory, or process memory.
//! [`StoreConfig`] selects and connects one of them from environment
//! variables.

pub mod config;
pub mod storage;

pub use config::{StoreConfig, StoreKind};
pub use storage::{ObjectStoreStorage, ObjectStoreStorageBuilder};
