//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Minimum accepted length of `SESSION_SECRET` in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Object storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// Process-local store, for development without cloud credentials.
    Memory,
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Bucket holding uploaded images and translation dictionaries.
    pub s3_bucket: String,

    /// Region of the bucket, also used to derive public image URLs.
    pub aws_region: String,

    /// Custom S3 endpoint (MinIO, LocalStack, ...).
    pub s3_endpoint_url: Option<String>,

    /// Which object store implementation to use (default: s3).
    pub storage_backend: StorageBackend,

    /// OAuth client id issued by the identity provider.
    pub oauth_client_id: String,

    /// OAuth client secret issued by the identity provider.
    pub oauth_client_secret: String,

    /// Callback URL registered with the identity provider.
    pub oauth_callback_url: String,

    /// Secret used to sign session cookies.
    pub session_secret: String,

    /// Redis connection URL. When None, sessions are kept in memory.
    pub redis_url: Option<String>,

    /// Whether the session cookie carries the `Secure` attribute (default: true).
    pub cookie_secure: bool,

    /// Path to the Tera templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Directory for the local translation file cache (default: ./translations).
    pub translations_cache_dir: PathBuf,

    /// Supported language codes, in display order (default: en,es).
    pub supported_languages: Vec<String>,

    /// Maximum accepted request body for uploads, in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{name} environment variable is required"))
        };

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let s3_bucket = required("S3_BUCKET")?;
        let aws_region = required("AWS_REGION")?;
        let s3_endpoint_url = lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty());

        let storage_backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE_BACKEND must be 's3' or 'memory', got '{other}'"),
        };

        let oauth_client_id = required("OAUTH_CLIENT_ID")?;
        let oauth_client_secret = required("OAUTH_CLIENT_SECRET")?;
        let oauth_callback_url = lookup("OAUTH_CALLBACK_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}/auth/google/callback"));

        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes long");
        }

        let redis_url = lookup("REDIS_URL").filter(|v| !v.is_empty());

        let cookie_secure = lookup("COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let templates_dir = lookup("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./templates"));

        let translations_cache_dir = lookup("TRANSLATIONS_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./translations"));

        let supported_languages: Vec<String> = lookup("SUPPORTED_LANGUAGES")
            .unwrap_or_else(|| "en,es".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if supported_languages.is_empty() {
            bail!("SUPPORTED_LANGUAGES must list at least one language code");
        }

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|| (10 * 1024 * 1024).to_string())
            .parse()
            .context("MAX_UPLOAD_BYTES must be a valid usize")?;

        Ok(Self {
            port,
            s3_bucket,
            aws_region,
            s3_endpoint_url,
            storage_backend,
            oauth_client_id,
            oauth_client_secret,
            oauth_callback_url,
            session_secret,
            redis_url,
            cookie_secure,
            templates_dir,
            translations_cache_dir,
            supported_languages,
            max_upload_bytes,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("s3_bucket", &self.s3_bucket)
            .field("aws_region", &self.aws_region)
            .field("s3_endpoint_url", &self.s3_endpoint_url)
            .field("storage_backend", &self.storage_backend)
            .field("oauth_client_id", &self.oauth_client_id)
            .field("oauth_callback_url", &self.oauth_callback_url)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .field("cookie_secure", &self.cookie_secure)
            .field("templates_dir", &self.templates_dir)
            .field("translations_cache_dir", &self.translations_cache_dir)
            .field("supported_languages", &self.supported_languages)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}
