//! Image upload and listing on top of the object store.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::storage::{ObjectStore, StorageError};

/// Object store prefix for uploaded images.
pub const IMAGE_PREFIX: &str = "images/";

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "image";

/// Fallback content type when the client declares none and sniffing fails.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Image upload result.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Image service.
pub struct ImageService {
    store: Arc<dyn ObjectStore>,
}

impl ImageService {
    /// Create a new image service.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store an uploaded image under a timestamp-derived key.
    ///
    /// Keys are not checked for uniqueness; two uploads in the same
    /// millisecond with the same extension overwrite each other.
    pub async fn upload(
        &self,
        filename: &str,
        declared_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<UploadedImage, StorageError> {
        let key = image_key(filename, Utc::now());
        let content_type = resolve_content_type(declared_type, &data);
        let size = data.len();

        self.store.put(&key, data, &content_type).await?;

        let url = self.store.public_url(&key);
        info!(key = %key, size, content_type = %content_type, "image uploaded");

        Ok(UploadedImage {
            key,
            url,
            content_type,
            size,
        })
    }

    /// Public URLs of every stored image, in key order.
    pub async fn list_urls(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.store.list(IMAGE_PREFIX).await?;
        Ok(keys
            .iter()
            .filter(|key| key.len() > IMAGE_PREFIX.len())
            .map(|key| self.store.public_url(key))
            .collect())
    }
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService")
            .field("store", &self.store.scheme())
            .finish()
    }
}

/// Storage key for an upload: prefix, Unix milliseconds, original extension.
pub fn image_key(filename: &str, now: DateTime<Utc>) -> String {
    format!(
        "{IMAGE_PREFIX}{}{}",
        now.timestamp_millis(),
        file_extension(filename)
    )
}

/// Lower-cased extension with its leading dot, or empty.
///
/// Anything but ASCII alphanumerics is dropped so the key stays URL-safe.
fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Declared content type, else sniffed from the bytes, else octet-stream.
fn resolve_content_type(declared: Option<&str>, data: &[u8]) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .or_else(|| infer::get(data).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
