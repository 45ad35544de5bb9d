//! Lamport's bakery algorithm as a distributed mutex over an object store.
//!
//! Participants share no memory and no lock service: every step of the
//! protocol is a put, get or delete of a well-known key, and every wait is
//! a poll followed by a randomized sleep.

pub mod backoff;
pub mod lock;
pub mod provider;

pub use backoff::Backoff;
pub use lock::BakeryMutex;
pub use provider::{BakeryLockProvider, BakeryLockProviderBuilder};
