//! Object storage backends.
//!
//! Provides the [`ObjectStore`] trait used for images and translation
//! dictionaries, with an S3 implementation and an in-process one.

mod memory;
mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Object storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key does not exist in the bucket.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// Any other failure talking to the backend.
    #[error("object storage backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl StorageError {
    /// Whether this error means "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Object storage backend trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes.
    ///
    /// Returns [`StorageError::NotFound`] when the key is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store an object with the given content type, replacing any existing one.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// List every key under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Public URL of an object.
    fn public_url(&self, key: &str) -> String;

    /// Storage scheme (e.g. "s3", "memory").
    fn scheme(&self) -> &'static str;
}

/// Public virtual-hosted-style URL for an object in a bucket.
pub fn public_object_url(bucket: &str, region: &str, key: &str) -> String {
    format!(
        "https://{bucket}.s3.{region}.amazonaws.com/{}",
        key.trim_start_matches('/')
    )
}
