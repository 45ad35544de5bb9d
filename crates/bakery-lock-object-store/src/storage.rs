//! [`ObjectStorage`] adapter over the `object_store` crate.

use std::path::PathBuf;
use std::sync::Arc;

use bakery_lock_core::error::{StoreError, StoreResult};
use bakery_lock_core::traits::ObjectStorage;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::instrument;

/// Builder for an S3 or S3-compatible (MinIO, Ceph, ...) storage adapter.
///
/// Requests use path-style addressing so that endpoints without wildcard
/// DNS work.
pub struct ObjectStoreStorageBuilder {
    bucket: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    allow_http: bool,
    prefix: Option<String>,
}

impl ObjectStoreStorageBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            bucket: None,
            endpoint: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
            prefix: None,
        }
    }

    /// Sets the bucket holding the lock objects.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Sets a custom endpoint URL.
    ///
    /// An `http://` endpoint implies [`allow_http`](Self::allow_http).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if endpoint.starts_with("http://") {
            self.allow_http = true;
        }
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets static credentials.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Allows plain HTTP connections.
    pub fn allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Stores every object under `prefix` inside the bucket.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if no bucket is set or the S3 client
    /// rejects the configuration.
    pub fn build(self) -> StoreResult<ObjectStoreStorage> {
        let bucket = self
            .bucket
            .ok_or_else(|| StoreError::Config("bucket not specified".to_string()))?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&bucket)
            .with_allow_http(self.allow_http)
            .with_virtual_hosted_style_request(false);

        if let Some(ref endpoint) = self.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(ref region) = self.region {
            builder = builder.with_region(region);
        }
        if let Some(ref access_key_id) = self.access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(ref secret_access_key) = self.secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build S3 store: {e}")))?;

        Ok(ObjectStoreStorage::new(Arc::new(store), "s3", self.prefix))
    }
}

impl Default for ObjectStoreStorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Object storage backed by any [`object_store::ObjectStore`].
///
/// `object_store::Error::NotFound` becomes [`StoreError::NotFound`]; every
/// other failure becomes [`StoreError::Backend`]. No request is retried
/// here.
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    backend: &'static str,
    /// Normalized prefix including the trailing `/`, or empty.
    prefix: String,
}

impl ObjectStoreStorage {
    fn new(store: Arc<dyn ObjectStore>, backend: &'static str, prefix: Option<String>) -> Self {
        let prefix = prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| format!("{p}/"))
            .unwrap_or_default();
        Self {
            store,
            backend,
            prefix,
        }
    }

    /// Returns a new builder for an S3 adapter.
    pub fn builder() -> ObjectStoreStorageBuilder {
        ObjectStoreStorageBuilder::new()
    }

    /// Wraps an already configured store.
    pub fn from_store(store: Arc<dyn ObjectStore>, backend: &'static str) -> Self {
        Self::new(store, backend, None)
    }

    /// In-process store; every handle cloned from it sees the same objects.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory", None)
    }

    /// Stores objects as files under `directory`, creating it if needed.
    ///
    /// Several processes on one host can coordinate through a shared
    /// directory.
    pub fn local(directory: impl Into<PathBuf>) -> StoreResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| {
            StoreError::Config(format!(
                "failed to create directory '{}': {e}",
                directory.display()
            ))
        })?;
        let store = LocalFileSystem::new_with_prefix(&directory).map_err(|e| {
            StoreError::Config(format!(
                "failed to open directory '{}': {e}",
                directory.display()
            ))
        })?;
        Ok(Self::new(Arc::new(store), "local", None))
    }

    /// Returns a copy that stores every object under `prefix`.
    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        Self::new(self.store, self.backend, Some(prefix.into()))
    }

    /// The underlying store.
    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn path(&self, key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}{key}", self.prefix))
    }
}

fn map_error(key: &str, err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::NotFound(key.to_string()),
        other => StoreError::backend(other),
    }
}

impl ObjectStorage for ObjectStoreStorage {
    #[instrument(
        level = "trace",
        skip(self, value),
        fields(backend = self.backend, len = value.len())
    )]
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.store
            .put(&self.path(key), PutPayload::from(value))
            .await
            .map_err(|e| map_error(key, e))?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self), fields(backend = self.backend))]
    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let result = self
            .store
            .get(&self.path(key))
            .await
            .map_err(|e| map_error(key, e))?;
        result.bytes().await.map_err(|e| map_error(key, e))
    }

    #[instrument(level = "trace", skip(self), fields(backend = self.backend))]
    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.store
            .delete(&self.path(key))
            .await
            .map_err(|e| map_error(key, e))
    }

    fn backend_name(&self) -> &'static str {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_lock_core::storage::ObjectStorageExt;

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let storage = ObjectStoreStorage::in_memory();
        let err = storage.get("Number_0").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref key) if key == "Number_0"), "{err:?}");
        assert!(!storage.exists("Entering_0").await.unwrap());
        assert_eq!(storage.get_int("Number_0", 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn put_get_delete() {
        let storage = ObjectStoreStorage::in_memory();
        storage.put_int("NEXT", 17).await.unwrap();
        assert_eq!(storage.get("NEXT").await.unwrap(), Bytes::from_static(b"17"));

        storage.remove("NEXT").await.unwrap();
        assert!(!storage.exists("NEXT").await.unwrap());
        storage.remove("NEXT").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_objects() {
        let a = ObjectStoreStorage::in_memory();
        let b = a.clone();
        a.put_empty("Entering_2").await.unwrap();
        assert!(b.exists("Entering_2").await.unwrap());
    }

    #[tokio::test]
    async fn prefix_namespaces_objects() {
        let root = ObjectStoreStorage::in_memory();
        let scoped = root.clone().with_prefix("/team-a/");
        scoped.put_int("Number_1", 3).await.unwrap();

        assert!(!root.exists("Number_1").await.unwrap());
        assert_eq!(root.get_int("team-a/Number_1", 0).await.unwrap(), 3);
        assert_eq!(scoped.get_int("Number_1", 0).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn local_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ObjectStoreStorage::local(dir.path().join("locks")).unwrap();
        assert_eq!(storage.backend_name(), "local");

        storage.put_empty("Entering_0").await.unwrap();
        assert!(dir.path().join("locks").join("Entering_0").exists());
        assert!(storage.exists("Entering_0").await.unwrap());

        // The filesystem backend reports deletes of missing files.
        storage.remove("Entering_0").await.unwrap();
        assert!(storage.delete("Entering_0").await.unwrap_err().is_not_found());
        storage.remove("Entering_0").await.unwrap();
    }

    #[test]
    fn builder_requires_bucket() {
        let result = ObjectStoreStorage::builder().region("us-east-1").build();
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn builder_accepts_s3_compatible_endpoint() {
        let storage = ObjectStoreStorage::builder()
            .bucket("locks")
            .endpoint("http://127.0.0.1:9000")
            .region("us-east-1")
            .credentials("minio", "minio123")
            .prefix("bench")
            .build()
            .unwrap();
        assert_eq!(storage.backend_name(), "s3");
        assert_eq!(storage.path("NEXT").to_string(), "bench/NEXT");
    }

    #[test]
    fn plain_http_follows_endpoint_unless_set() {
        let builder = ObjectStoreStorage::builder().endpoint("https://s3.example.com");
        assert!(!builder.allow_http);
        let builder = builder.allow_http(true);
        assert!(builder.allow_http);

        let builder = ObjectStoreStorage::builder().endpoint("http://127.0.0.1:9000");
        assert!(builder.allow_http);
        let storage = builder.bucket("locks").region("us-east-1").build().unwrap();
        assert_eq!(storage.backend_name(), "s3");
    }

    #[tokio::test]
    async fn wraps_an_existing_store() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let storage = ObjectStoreStorage::from_store(store.clone(), "custom");
        assert_eq!(storage.backend_name(), "custom");
        assert!(Arc::ptr_eq(storage.inner(), &store));

        storage.put_int("NEXT", 9).await.unwrap();
        let raw = store
            .get(&ObjectPath::from("NEXT"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(raw, Bytes::from_static(b"9"));
    }
}
