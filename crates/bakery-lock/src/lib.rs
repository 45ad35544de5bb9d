//! Distributed mutual exclusion over object stores.
//!
//! This crate provides a distributed mutex for a fixed group of participants
//! that share nothing but a key-value object store (S3, an S3-compatible
//! service, a local directory). The store needs no compare-and-swap,
//! conditional writes or leases: the mutex is Lamport's bakery algorithm
//! with every shared register kept as an object.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bakery_lock::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Every participant must see the same store.
//!     let storage = Arc::new(ObjectStoreStorage::local("/tmp/bakery")?);
//!     let provider = BakeryLockProvider::new(storage.clone(), 2)?;
//!
//!     // This process is participant 0 of 2.
//!     let mut mutex = provider.create_mutex(0)?;
//!
//!     mutex.lock().await?;
//!     // Critical section - no other participant is here
//!     let next = storage.get_int("NEXT", 0).await?;
//!     storage.put_int("NEXT", next + 1).await?;
//!     mutex.unlock().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! ## S3 and S3-compatible services
//!
//! ```rust,no_run
//! use bakery_lock::ObjectStoreStorage;
//!
//! let storage = ObjectStoreStorage::builder()
//!     .bucket("locks")
//!     .endpoint("http://127.0.0.1:9000")
//!     .region("us-east-1")
//!     .credentials("access-key", "secret-key")
//!     .build()?;
//! # Ok::<(), bakery_lock::StoreError>(())
//! ```
//!
//! [`StoreConfig::from_env`] builds the same from `S3_BUCKET`,
//! `S3_ENDPOINT`, `S3_REGION`, `AWS_ACCESS_KEY_ID` and
//! `AWS_SECRET_ACCESS_KEY`.
//!
//! ## Local directory
//!
//! Participants on one host can share a directory through
//! [`ObjectStoreStorage::local`].
//!
//! ## Memory
//!
//! [`MemoryStorage`] and [`ObjectStoreStorage::in_memory`] serve
//! participants inside one process, mostly for tests.
//!
//! # Guarantees and limits
//!
//! - **Mutual exclusion** as long as the store makes a completed write
//!   visible to every later read.
//! - **First come, first served** by ticket, ties broken by participant id.
//! - **No crash recovery**: a participant that dies holding the lock or
//!   drawing a ticket blocks the others until its objects are removed.
//! - Polls back off for a random delay (5 to 15 seconds by default, see
//!   [`Backoff`]); tune it with [`BakeryLockProviderBuilder::backoff`].
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `bakery-lock-core`: Traits, storage primitives, errors, in-memory store
//! - `bakery-lock-mutex`: The bakery mutex and its provider
//! - `bakery-lock-object-store`: `object_store` backed storage
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use bakery_lock_core::*;

// Re-export the mutex
pub use bakery_lock_mutex::{Backoff, BakeryLockProvider, BakeryLockProviderBuilder, BakeryMutex};

// Re-export object store backend
pub use bakery_lock_object_store::{
    ObjectStoreStorage, ObjectStoreStorageBuilder, StoreConfig, StoreKind,
};
