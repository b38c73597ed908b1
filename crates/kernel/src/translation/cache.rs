//! Local JSON file cache for translation dictionaries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use super::{Dictionary, TranslationError, validate_language};

/// One pretty-printed JSON file per language under a fixed directory.
#[derive(Debug, Clone)]
pub struct LocalTranslationCache {
    dir: PathBuf,
}

impl LocalTranslationCache {
    /// Open the cache, creating its directory if absent.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create translation cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a language's cache file.
    pub fn path_for(&self, language: &str) -> Result<PathBuf, TranslationError> {
        validate_language(language)?;
        Ok(self.dir.join(format!("{language}.json")))
    }

    /// Load a language's dictionary.
    ///
    /// A missing, unreadable, or malformed file yields an empty dictionary.
    pub async fn load(&self, language: &str) -> Dictionary {
        let path = match self.path_for(language) {
            Ok(path) => path,
            Err(e) => {
                warn!(language = %language, error = %e, "refusing to read translation cache");
                return Dictionary::new();
            }
        };

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Dictionary::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read translation cache");
                return Dictionary::new();
            }
        };

        match serde_json::from_slice::<Dictionary>(&raw) {
            Ok(dictionary) => {
                debug!(language = %language, keys = dictionary.len(), "translation cache loaded");
                dictionary
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed translation cache");
                Dictionary::new()
            }
        }
    }

    /// Write a language's dictionary.
    ///
    /// The file is written beside the target and renamed over it, so a
    /// concurrent reader sees either the old or the new content.
    pub async fn store(&self, language: &str, dictionary: &Dictionary) -> Result<()> {
        let path = self.path_for(language)?;
        let tmp = path.with_extension("json.tmp");

        let body = serde_json::to_vec_pretty(dictionary)
            .context("failed to serialize translation dictionary")?;

        fs::write(&tmp, &body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;

        debug!(language = %language, keys = dictionary.len(), "translation cache written");
        Ok(())
    }
}
