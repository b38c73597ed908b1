//! In-process translation registry.
//!
//! Owns the language → dictionary map. Reads are served from memory; updates
//! are persisted to the object store first, then to the local cache, and only
//! then published to readers. Writers to the same language are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{
    Dictionary, LocalTranslationCache, TranslationError, remote_key, validate_language,
};
use crate::storage::{ObjectStore, StorageError};

/// Where a language's dictionary came from during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionarySource {
    /// Non-empty local cache file; the object store was not consulted.
    LocalCache,
    /// Fetched from the object store (possibly empty) and written back locally.
    Remote,
    /// The object store failed; the language was left unloaded.
    Failed,
}

/// Per-language bootstrap result.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    pub language: String,
    pub source: DictionarySource,
    pub keys: usize,
}

/// Translation registry shared across handlers.
pub struct TranslationRegistry {
    /// Supported language codes, in configured order.
    languages: Vec<String>,
    /// Published dictionaries.
    dictionaries: RwLock<HashMap<String, Dictionary>>,
    /// One writer lock per supported language.
    writers: HashMap<String, Mutex<()>>,
    cache: LocalTranslationCache,
    store: Arc<dyn ObjectStore>,
}

impl TranslationRegistry {
    /// Create an empty registry. Call [`bootstrap`](Self::bootstrap) before serving.
    pub fn new(
        languages: Vec<String>,
        cache: LocalTranslationCache,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, TranslationError> {
        for language in &languages {
            validate_language(language)?;
        }

        let writers = languages
            .iter()
            .map(|language| (language.clone(), Mutex::new(())))
            .collect();

        Ok(Self {
            languages,
            dictionaries: RwLock::new(HashMap::new()),
            writers,
            cache,
            store,
        })
    }

    /// Populate every supported language from the local cache or the object store.
    ///
    /// A failing language is logged and skipped; the others still load.
    pub async fn bootstrap(&self) -> Vec<BootstrapOutcome> {
        let mut outcomes = Vec::with_capacity(self.languages.len());

        for language in &self.languages {
            let outcome = match self.bootstrap_language(language).await {
                Ok((source, dictionary)) => {
                    let keys = dictionary.len();
                    self.dictionaries.write().insert(language.clone(), dictionary);
                    info!(language = %language, ?source, keys, "translations loaded");
                    BootstrapOutcome {
                        language: language.clone(),
                        source,
                        keys,
                    }
                }
                Err(e) => {
                    error!(language = %language, error = %e, "failed to load translations");
                    BootstrapOutcome {
                        language: language.clone(),
                        source: DictionarySource::Failed,
                        keys: 0,
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn bootstrap_language(
        &self,
        language: &str,
    ) -> Result<(DictionarySource, Dictionary), TranslationError> {
        let local = self.cache.load(language).await;
        if !local.is_empty() {
            return Ok((DictionarySource::LocalCache, local));
        }

        let remote = self.fetch_remote(language).await?;
        if let Err(e) = self.cache.store(language, &remote).await {
            warn!(language = %language, error = %e, "failed to seed translation cache");
        }

        Ok((DictionarySource::Remote, remote))
    }

    /// Supported language codes, in configured order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Look up a translation.
    ///
    /// Unknown languages and missing keys both yield an empty string.
    pub fn get(&self, language: &str, key: &str) -> String {
        self.dictionaries
            .read()
            .get(language)
            .and_then(|dictionary| dictionary.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of languages with a published dictionary.
    pub fn loaded_count(&self) -> usize {
        self.dictionaries.read().len()
    }

    /// Copy of a language's in-memory dictionary, if loaded.
    pub fn dictionary(&self, language: &str) -> Option<Dictionary> {
        self.dictionaries.read().get(language).cloned()
    }

    /// Read a language's dictionary straight from the object store.
    ///
    /// A missing object is an empty dictionary.
    pub async fn fetch_remote(&self, language: &str) -> Result<Dictionary, TranslationError> {
        validate_language(language)?;

        match self.store.get(&remote_key(language)).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(StorageError::NotFound { .. }) => Ok(Dictionary::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Set `key` to `value` for a supported language and persist the dictionary.
    ///
    /// The object store is written first. If that fails nothing else changes.
    /// A local cache failure after a successful remote write is logged, and
    /// the new value is still published.
    pub async fn update(
        &self,
        language: &str,
        key: &str,
        value: &str,
    ) -> Result<(), TranslationError> {
        validate_language(language)?;
        if key.is_empty() {
            return Err(TranslationError::EmptyKey);
        }
        let writer = self
            .writers
            .get(language)
            .ok_or_else(|| TranslationError::UnsupportedLanguage(language.to_string()))?;

        let _guard = writer.lock().await;

        // A language that failed to bootstrap is read back first so the
        // write does not clobber the remote dictionary.
        let mut snapshot = match self.dictionary(language) {
            Some(dictionary) => dictionary,
            None => self.fetch_remote(language).await?,
        };
        snapshot.insert(key.to_string(), value.to_string());

        let body = serde_json::to_vec_pretty(&snapshot)?;
        self.store
            .put(&remote_key(language), body, "application/json")
            .await?;

        if let Err(e) = self.cache.store(language, &snapshot).await {
            warn!(language = %language, error = %e, "failed to update translation cache");
        }

        self.dictionaries
            .write()
            .insert(language.to_string(), snapshot);

        info!(language = %language, key = %key, "translation updated");
        Ok(())
    }
}

impl std::fmt::Debug for TranslationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationRegistry")
            .field("languages", &self.languages)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    struct Fixture {
        _tmp: tempfile::TempDir,
        cache_dir: std::path::PathBuf,
        store: Arc<MemoryObjectStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let cache_dir = tmp.path().join("translations");
            Self {
                _tmp: tmp,
                cache_dir,
                store: Arc::new(MemoryObjectStore::new("bucket", "us-east-1")),
            }
        }

        async fn registry(&self) -> TranslationRegistry {
            let cache = LocalTranslationCache::open(&self.cache_dir).await.unwrap();
            TranslationRegistry::new(
                vec!["en".to_string(), "es".to_string()],
                cache,
                self.store.clone(),
            )
            .unwrap()
        }

        fn write_local(&self, language: &str, json: &str) {
            std::fs::create_dir_all(&self.cache_dir).unwrap();
            std::fs::write(self.cache_dir.join(format!("{language}.json")), json).unwrap();
        }

        fn read_local(&self, language: &str) -> Dictionary {
            let raw = std::fs::read(self.cache_dir.join(format!("{language}.json"))).unwrap();
            serde_json::from_slice(&raw).unwrap()
        }
    }

    fn dict(pairs: &[(&str, &str)]) -> Dictionary {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn non_empty_local_cache_wins_without_remote_call() {
        let fx = Fixture::new();
        fx.write_local("en", r#"{"hello": "Hello (local)"}"#);
        fx.write_local("es", r#"{"hello": "Hola (local)"}"#);
        fx.store
            .insert("translations/en.json", r#"{"hello": "Hello (remote)"}"#, "application/json");

        let registry = fx.registry().await;
        let outcomes = registry.bootstrap().await;

        assert!(outcomes.iter().all(|o| o.source == DictionarySource::LocalCache));
        assert_eq!(registry.dictionary("en").unwrap(), dict(&[("hello", "Hello (local)")]));
        assert_eq!(fx.store.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_local_and_missing_remote_yields_empty_and_writes_cache() {
        let fx = Fixture::new();
        let registry = fx.registry().await;

        let outcomes = registry.bootstrap().await;

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert_eq!(outcome.source, DictionarySource::Remote);
            assert_eq!(outcome.keys, 0);
            assert!(registry.dictionary(&outcome.language).unwrap().is_empty());
            assert!(fx.read_local(&outcome.language).is_empty());
        }
    }

    #[tokio::test]
    async fn empty_local_falls_back_to_remote_and_seeds_cache() {
        let fx = Fixture::new();
        fx.write_local("es", "{}");
        fx.store
            .insert("translations/es.json", r#"{"bye": "Adiós"}"#, "application/json");

        let registry = fx.registry().await;
        registry.bootstrap().await;

        assert_eq!(registry.get("es", "bye"), "Adiós");
        assert_eq!(fx.read_local("es"), dict(&[("bye", "Adiós")]));
    }

    #[tokio::test]
    async fn remote_failure_skips_only_that_language() {
        let fx = Fixture::new();
        fx.write_local("en", r#"{"hello": "Hello"}"#);
        fx.store.set_available(false);

        let registry = fx.registry().await;
        let outcomes = registry.bootstrap().await;

        assert_eq!(outcomes[0].source, DictionarySource::LocalCache);
        assert_eq!(outcomes[1].source, DictionarySource::Failed);
        assert_eq!(registry.get("en", "hello"), "Hello");
        assert!(registry.dictionary("es").is_none());
    }

    #[tokio::test]
    async fn malformed_remote_dictionary_counts_as_failure() {
        let fx = Fixture::new();
        fx.store
            .insert("translations/en.json", "[1, 2, 3]", "application/json");

        let registry = fx.registry().await;
        let outcomes = registry.bootstrap().await;

        assert_eq!(outcomes[0].source, DictionarySource::Failed);
        assert_eq!(outcomes[1].source, DictionarySource::Remote);
    }

    #[tokio::test]
    async fn get_returns_empty_for_missing_key_or_language() {
        let fx = Fixture::new();
        fx.write_local("en", r#"{"hello": "Hello"}"#);
        let registry = fx.registry().await;
        registry.bootstrap().await;

        assert_eq!(registry.get("en", "hello"), "Hello");
        assert_eq!(registry.get("en", "missing"), "");
        assert_eq!(registry.get("de", "hello"), "");
    }

    #[tokio::test]
    async fn update_persists_to_remote_and_local() {
        let fx = Fixture::new();
        let registry = fx.registry().await;
        registry.bootstrap().await;

        registry.update("en", "hello", "Hello World").await.unwrap();

        let expected = dict(&[("hello", "Hello World")]);
        assert_eq!(registry.fetch_remote("en").await.unwrap(), expected);
        assert_eq!(fx.read_local("en"), expected);
        assert_eq!(registry.get("en", "hello"), "Hello World");
    }

    #[tokio::test]
    async fn update_keeps_existing_keys() {
        let fx = Fixture::new();
        fx.write_local("en", r#"{"hello": "Hello", "bye": "Bye"}"#);
        let registry = fx.registry().await;
        registry.bootstrap().await;

        registry.update("en", "hello", "Hi").await.unwrap();

        assert_eq!(
            registry.fetch_remote("en").await.unwrap(),
            dict(&[("bye", "Bye"), ("hello", "Hi")])
        );
    }

    #[tokio::test]
    async fn failed_remote_write_changes_nothing() {
        let fx = Fixture::new();
        fx.write_local("en", r#"{"hello": "Hello"}"#);
        let registry = fx.registry().await;
        registry.bootstrap().await;
        fx.store.set_available(false);

        let err = registry.update("en", "hello", "Howdy").await.unwrap_err();

        assert!(matches!(err, TranslationError::Upstream(_)));
        assert_eq!(registry.get("en", "hello"), "Hello");
        assert_eq!(fx.read_local("en"), dict(&[("hello", "Hello")]));
    }

    #[tokio::test]
    async fn update_creates_dictionary_for_unloaded_language() {
        let fx = Fixture::new();
        fx.store.set_available(false);
        let registry = fx.registry().await;
        registry.bootstrap().await;
        assert!(registry.dictionary("es").is_none());

        fx.store.set_available(true);
        registry.update("es", "hello", "Hola").await.unwrap();

        assert_eq!(registry.dictionary("es").unwrap(), dict(&[("hello", "Hola")]));
    }

    #[tokio::test]
    async fn update_of_unloaded_language_keeps_remote_keys() {
        let fx = Fixture::new();
        fx.store
            .insert("translations/es.json", r#"{"bye": "Adiós"}"#, "application/json");
        fx.store.set_available(false);
        let registry = fx.registry().await;
        registry.bootstrap().await;

        fx.store.set_available(true);
        registry.update("es", "hello", "Hola").await.unwrap();

        assert_eq!(
            registry.fetch_remote("es").await.unwrap(),
            dict(&[("bye", "Adiós"), ("hello", "Hola")])
        );
    }

    #[tokio::test]
    async fn update_rejects_unsupported_language_and_empty_key() {
        let fx = Fixture::new();
        let registry = fx.registry().await;

        assert!(matches!(
            registry.update("de", "hello", "Hallo").await,
            Err(TranslationError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            registry.update("en", "", "x").await,
            Err(TranslationError::EmptyKey)
        ));
        assert_eq!(fx.store.call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_updates_to_one_language_all_land() {
        let fx = Fixture::new();
        let registry = Arc::new(fx.registry().await);
        registry.bootstrap().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .update("en", &format!("key{i}"), &format!("value{i}"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let remote = registry.fetch_remote("en").await.unwrap();
        assert_eq!(remote.len(), 8);
        assert_eq!(fx.read_local("en").len(), 8);
    }

    #[tokio::test]
    async fn fetch_remote_reports_backend_failure() {
        let fx = Fixture::new();
        let registry = fx.registry().await;
        fx.store.set_available(false);

        assert!(matches!(
            registry.fetch_remote("en").await,
            Err(TranslationError::Upstream(_))
        ));
    }
}
