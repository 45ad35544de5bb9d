//! Workload configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use bakery_lock_mutex::Backoff;
use bytes::Bytes;

use crate::error::{DriverError, DriverResult};

pub const ENV_NUM_PROCS: &str = "BAKERY_NUM_PROCS";
pub const ENV_ITERATIONS: &str = "BAKERY_ITERATIONS";
pub const ENV_BACKOFF_MIN_MS: &str = "BAKERY_BACKOFF_MIN_MS";
pub const ENV_BACKOFF_MAX_MS: &str = "BAKERY_BACKOFF_MAX_MS";
/// File whose contents are stored in every `data_*` object.
pub const ENV_PAYLOAD_FILE: &str = "BAKERY_PAYLOAD_FILE";

const DEFAULT_NUM_PROCS: usize = 5;
const DEFAULT_ITERATIONS: usize = 10;

/// Settings for one workload run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Participants, each running on its own task.
    pub num_procs: usize,
    /// Critical sections per participant.
    pub iterations: usize,
    pub backoff: Backoff,
    /// Payload source; an empty object is written when unset.
    pub payload_file: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            num_procs: DEFAULT_NUM_PROCS,
            iterations: DEFAULT_ITERATIONS,
            backoff: Backoff::default(),
            payload_file: None,
        }
    }
}

impl DriverConfig {
    pub fn from_env() -> DriverResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DriverResult<Self> {
        let defaults = Self::default();
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let num_procs = parse_or(&lookup, ENV_NUM_PROCS, defaults.num_procs)?;
        if num_procs == 0 {
            return Err(DriverError::Config(format!("{ENV_NUM_PROCS} must be at least 1")));
        }
        let iterations = parse_or(&lookup, ENV_ITERATIONS, defaults.iterations)?;

        let min_ms = parse_or(&lookup, ENV_BACKOFF_MIN_MS, millis(defaults.backoff.min()))?;
        let max_ms = parse_or(&lookup, ENV_BACKOFF_MAX_MS, millis(defaults.backoff.max()))?;
        let backoff = Backoff::from_millis(min_ms, max_ms).map_err(|e| {
            DriverError::Config(format!("{ENV_BACKOFF_MIN_MS}/{ENV_BACKOFF_MAX_MS}: {e}"))
        })?;

        Ok(Self {
            num_procs,
            iterations,
            backoff,
            payload_file: lookup(ENV_PAYLOAD_FILE).map(PathBuf::from),
        })
    }

    /// Reads the payload file, or returns an empty payload.
    pub async fn load_payload(&self) -> DriverResult<Bytes> {
        let Some(ref path) = self.payload_file else {
            return Ok(Bytes::new());
        };
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| DriverError::Payload {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Bytes::from(contents))
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> DriverResult<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| DriverError::Config(format!("{name}={value:?}: {e}"))),
        None => Ok(default),
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
