//! In-process object storage.
//!
//! Selected with `STORAGE_BACKEND=memory` for local development; objects
//! vanish on restart. Public URLs follow the same bucket/region pattern as S3
//! so pages render identically.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{ObjectStore, StorageError, public_object_url};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// In-memory object store.
pub struct MemoryObjectStore {
    bucket: String,
    region: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    /// Number of backend calls served (get, put, list).
    calls: AtomicUsize,
    /// When false every call fails as if the backend were down.
    available: AtomicBool,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            objects: RwLock::new(BTreeMap::new()),
            calls: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Place an object directly, without counting it as a backend call.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>, content_type: &str) {
        self.objects.write().insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    /// Read an object directly, without counting it as a backend call.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|o| o.data.clone())
    }

    /// Content type an object was stored with.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().get(key).map(|o| o.content_type.clone())
    }

    /// Total number of get/put/list calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulate a backend outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn begin_call(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Backend(anyhow::anyhow!(
                "memory object store is unavailable"
            )))
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.begin_call()?;
        self.object(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.begin_call()?;
        debug!(key = %key, size = data.len(), "object written to memory store");
        self.insert(key, data, content_type);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.begin_call()?;
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, &self.region, key)
    }

    fn scheme(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryObjectStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("objects", &self.objects.read().len())
            .finish()
    }
}
