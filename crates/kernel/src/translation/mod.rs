//! UI translation dictionaries.
//!
//! Each supported language owns a flat key/value dictionary. Dictionaries
//! live in two tiers: a local JSON file cache used to start quickly, and the
//! object store, which is authoritative.

mod cache;
mod registry;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::storage::StorageError;

pub use cache::LocalTranslationCache;
pub use registry::{BootstrapOutcome, DictionarySource, TranslationRegistry};

/// Flat key/value mapping for one language.
pub type Dictionary = BTreeMap<String, String>;

/// Object store prefix for translation dictionaries.
pub const TRANSLATIONS_PREFIX: &str = "translations/";

/// Longest accepted language code.
const MAX_LANGUAGE_LEN: usize = 16;

/// Translation errors.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("translation key must not be empty")]
    EmptyKey,

    #[error("translation store unavailable: {0}")]
    Upstream(#[from] StorageError),

    #[error("malformed translation dictionary: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl TranslationError {
    /// Whether the caller sent something unusable (as opposed to an upstream failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TranslationError::InvalidLanguage(_)
                | TranslationError::UnsupportedLanguage(_)
                | TranslationError::EmptyKey
        )
    }
}

/// Check that a language code is safe to embed in file names and object keys.
pub fn validate_language(language: &str) -> Result<(), TranslationError> {
    let valid = !language.is_empty()
        && language.len() <= MAX_LANGUAGE_LEN
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(TranslationError::InvalidLanguage(language.to_string()))
    }
}

/// Object key holding a language's dictionary.
pub fn remote_key(language: &str) -> String {
    format!("{TRANSLATIONS_PREFIX}{language}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_language_codes() {
        for code in ["en", "es", "pt-BR", "zh_Hant"] {
            assert!(validate_language(code).is_ok(), "{code} should be valid");
        }
    }

    #[test]
    fn rejects_path_like_codes() {
        for code in ["", "../etc", "en/fr", "en.json", "a".repeat(17).as_str()] {
            assert!(validate_language(code).is_err(), "{code:?} should be invalid");
        }
    }

    #[test]
    fn remote_key_layout() {
        assert_eq!(remote_key("en"), "translations/en.json");
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(TranslationError::EmptyKey.is_client_error());
        assert!(TranslationError::UnsupportedLanguage("de".into()).is_client_error());
        assert!(
            !TranslationError::Upstream(StorageError::Backend(anyhow::anyhow!("down")))
                .is_client_error()
        );
    }
}
