//! Amazon S3 (or S3-compatible) object storage.

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, warn};

use super::{ObjectStore, StorageError, public_object_url};

/// S3-compatible object storage.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    ///
    /// Uses the default AWS credential chain (env vars, config file, instance profile).
    /// A custom `endpoint_url` switches to path-style addressing for services
    /// like MinIO.
    pub async fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let region = region.into();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()));
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint_url.is_some())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: bucket.into(),
            region,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                if let Some(service_err) = err.as_service_error()
                    && service_err.is_no_such_key()
                {
                    return Err(StorageError::NotFound {
                        key: key.to_string(),
                    });
                }
                return Err(anyhow::Error::new(err)
                    .context("failed to get object from S3")
                    .into());
            }
        };

        let data = response
            .body
            .collect()
            .await
            .context("failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!(key = %key, size = data.len(), "object read from S3");
        Ok(data)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .context("failed to upload to S3")?;

        debug!(key = %key, size, content_type = %content_type, "object written to S3");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .context("failed to list S3 objects")?;

        if response.is_truncated().unwrap_or(false) {
            warn!(prefix = %prefix, "S3 listing truncated, only the first page is returned");
        }

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_string)
            .collect();

        debug!(prefix = %prefix, count = keys.len(), "listed S3 objects");
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, &self.region, key)
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}
