//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::auth::{GoogleProvider, IdentityProvider};
use crate::config::{Config, StorageBackend};
use crate::images::ImageService;
use crate::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::theme::ThemeEngine;
use crate::translation::{LocalTranslationCache, TranslationRegistry};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Object store holding images and translation dictionaries.
    store: Arc<dyn ObjectStore>,

    /// Image upload/listing service.
    images: ImageService,

    /// Translation registry, bootstrapped before the server starts.
    translations: Arc<TranslationRegistry>,

    /// External OAuth identity provider.
    identity: Arc<dyn IdentityProvider>,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Largest accepted upload body, in bytes.
    max_upload_bytes: usize,
}

/// Pieces an [`AppState`] is assembled from.
pub struct StateParts {
    pub store: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub theme: ThemeEngine,
    pub translations: Arc<TranslationRegistry>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Connects the object store, loads templates, and bootstraps the
    /// translation registry.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match config.storage_backend {
            StorageBackend::S3 => Arc::new(
                S3ObjectStore::new(
                    config.s3_bucket.as_str(),
                    config.aws_region.as_str(),
                    config.s3_endpoint_url.as_deref(),
                )
                .await,
            ),
            StorageBackend::Memory => Arc::new(MemoryObjectStore::new(
                config.s3_bucket.as_str(),
                config.aws_region.as_str(),
            )),
        };
        info!(storage = store.scheme(), bucket = %config.s3_bucket, "object store ready");

        let identity: Arc<dyn IdentityProvider> = Arc::new(GoogleProvider::new(
            config.oauth_client_id.as_str(),
            config.oauth_client_secret.as_str(),
            config.oauth_callback_url.as_str(),
        ));

        let theme = ThemeEngine::new(&config.templates_dir)
            .context("failed to load templates")?;

        let cache = LocalTranslationCache::open(&config.translations_cache_dir)
            .await
            .context("failed to open translation cache")?;
        let translations = Arc::new(
            TranslationRegistry::new(config.supported_languages.clone(), cache, store.clone())
                .context("invalid SUPPORTED_LANGUAGES")?,
        );
        translations.bootstrap().await;

        Ok(Self::from_parts(StateParts {
            store,
            identity,
            theme,
            translations,
            max_upload_bytes: config.max_upload_bytes,
        }))
    }

    /// Assemble state from already-initialized parts.
    pub fn from_parts(parts: StateParts) -> Self {
        let images = ImageService::new(parts.store.clone());
        Self {
            inner: Arc::new(AppStateInner {
                store: parts.store,
                images,
                translations: parts.translations,
                identity: parts.identity,
                theme: Arc::new(parts.theme),
                max_upload_bytes: parts.max_upload_bytes,
            }),
        }
    }

    /// Object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.store
    }

    /// Image service.
    pub fn images(&self) -> &ImageService {
        &self.inner.images
    }

    /// Translation registry.
    pub fn translations(&self) -> &Arc<TranslationRegistry> {
        &self.inner.translations
    }

    /// Identity provider.
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.identity
    }

    /// Theme engine.
    pub fn theme(&self) -> &Arc<ThemeEngine> {
        &self.inner.theme
    }

    /// Largest accepted upload body, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.inner.max_upload_bytes
    }
}
