//! Storage configuration read from the environment at process start.

use std::path::PathBuf;
use std::str::FromStr;

use bakery_lock_core::error::{StoreError, StoreResult};

use crate::storage::ObjectStoreStorage;

/// Selects the backend: `s3` (default), `local` or `memory`.
pub const ENV_STORE: &str = "BAKERY_STORE";
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_REGION: &str = "S3_REGION";
pub const ENV_BUCKET: &str = "S3_BUCKET";
/// Directory for the `local` backend.
pub const ENV_LOCAL_DIR: &str = "BAKERY_LOCAL_DIR";
/// Optional key prefix inside the bucket or directory.
pub const ENV_PREFIX: &str = "BAKERY_PREFIX";

/// Kind of object store to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// S3 or an S3-compatible endpoint.
    #[default]
    S3,
    /// Files in a local directory.
    Local,
    /// In-process memory; only useful when all participants share a process.
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Local => "local",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StoreKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::Config(format!(
                "unknown store kind '{other}' in {ENV_STORE} (expected s3, local or memory)"
            ))),
        }
    }
}

/// Connection settings for the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub prefix: Option<String>,
}

impl StoreConfig {
    /// Reads the configuration from environment variables.
    ///
    /// For the `s3` backend all of `AWS_ACCESS_KEY_ID`,
    /// `AWS_SECRET_ACCESS_KEY`, `S3_ENDPOINT`, `S3_REGION` and `S3_BUCKET`
    /// are required. The `local` backend requires `BAKERY_LOCAL_DIR`.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require = |name: &str| {
            lookup(name).ok_or_else(|| StoreError::Config(format!("set environment variable {name}")))
        };

        let kind = match lookup(ENV_STORE) {
            Some(value) => value.parse()?,
            None => StoreKind::default(),
        };
        let prefix = lookup(ENV_PREFIX);

        let config = match kind {
            StoreKind::S3 => Self {
                kind,
                access_key_id: Some(require(ENV_ACCESS_KEY_ID)?),
                secret_access_key: Some(require(ENV_SECRET_ACCESS_KEY)?),
                endpoint: Some(require(ENV_ENDPOINT)?),
                bucket: Some(require(ENV_BUCKET)?),
                region: Some(require(ENV_REGION)?),
                local_dir: None,
                prefix,
            },
            StoreKind::Local => Self {
                kind,
                local_dir: Some(PathBuf::from(require(ENV_LOCAL_DIR)?)),
                prefix,
                ..Self::default()
            },
            StoreKind::Memory => Self {
                kind,
                prefix,
                ..Self::default()
            },
        };
        Ok(config)
    }

    /// Connects the configured backend.
    pub fn build(&self) -> StoreResult<ObjectStoreStorage> {
        let storage = match self.kind {
            StoreKind::S3 => {
                let mut builder = ObjectStoreStorage::builder();
                if let Some(ref bucket) = self.bucket {
                    builder = builder.bucket(bucket);
                }
                if let Some(ref endpoint) = self.endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(ref region) = self.region {
                    builder = builder.region(region);
                }
                if let (Some(id), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
                    builder = builder.credentials(id, secret);
                }
                return match self.prefix {
                    Some(ref prefix) => builder.prefix(prefix).build(),
                    None => builder.build(),
                };
            }
            StoreKind::Local => {
                let dir = self.local_dir.as_ref().ok_or_else(|| {
                    StoreError::Config(format!("set environment variable {ENV_LOCAL_DIR}"))
                })?;
                ObjectStoreStorage::local(dir)?
            }
            StoreKind::Memory => ObjectStoreStorage::in_memory(),
        };

        Ok(match self.prefix {
            Some(ref prefix) => storage.with_prefix(prefix),
            None => storage,
        })
    }
}
