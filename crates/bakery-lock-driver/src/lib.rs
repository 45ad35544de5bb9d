//! Shared-counter workload for bakery locks.
//!
//! `num_procs` participants run in one process against a common object
//! store. Each one repeatedly takes the lock, reads the `NEXT` counter,
//! writes it back incremented, stores a `data_<seq>_<participant>` object
//! and releases the lock. Under mutual exclusion the produced sequence
//! numbers are unique and contiguous.

pub mod config;
pub mod error;
pub mod workload;

pub use config::DriverConfig;
pub use error::{DriverError, DriverResult};
pub use workload::{Produced, run, run_participant};
