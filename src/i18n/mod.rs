//! Internationalization (i18n) support for cubewatch
//!
//! Labels live in a JSON table of the form `{ label_key: { locale: text } }`
//! with an extra `Languages` entry mapping locale codes to display names.
//! The table ships embedded (Spanish and English) and can be replaced by a
//! file. It is loaded once and never mutated afterwards.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cubewatch::i18n::Translations;
//!
//! let translations = Translations::embedded()?;
//! let label = translations.translate("es", "Location");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Embedded default table
const EMBEDDED_MESSAGES: &str = include_str!("messages.json");

/// Errors raised while loading a translation table
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Failed to read translation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid translation table: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(rename = "Languages", default)]
    languages: BTreeMap<String, String>,
    #[serde(flatten)]
    labels: HashMap<String, HashMap<String, String>>,
}

/// Read-only translation table
#[derive(Debug, Clone)]
pub struct Translations {
    labels: HashMap<String, HashMap<String, String>>,
    languages: BTreeMap<String, String>,
}

impl Translations {
    /// Table compiled into the binary
    pub fn embedded() -> Result<Self, TranslationError> {
        Self::from_json(EMBEDDED_MESSAGES)
    }

    /// Load a table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, TranslationError> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            labels = table.labels.len(),
            languages = table.languages.len(),
            "Translations loaded"
        );
        Ok(table)
    }

    /// Parse a table from JSON text
    pub fn from_json(json: &str) -> Result<Self, TranslationError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Ok(Self {
            labels: raw.labels,
            languages: raw.languages,
        })
    }

    /// Load from `path` when given, else the embedded table
    pub fn load(path: Option<&Path>) -> Result<Self, TranslationError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    /// Text for `key` in `locale`
    ///
    /// Never fails: a missing key or locale yields a placeholder naming the key.
    pub fn translate(&self, locale: &str, key: &str) -> String {
        let locale = normalize_locale(locale);
        match self.labels.get(key).and_then(|texts| texts.get(&locale)) {
            Some(text) => text.clone(),
            None => {
                tracing::debug!(locale = %locale, key = %key, "Missing translation");
                missing(key)
            }
        }
    }

    /// Like [`Translations::translate`], substituting `{name}` placeholders
    pub fn translate_with(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.translate(locale, key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// Supported locale codes and their display names
    pub fn languages(&self) -> &BTreeMap<String, String> {
        &self.languages
    }

    /// Whether `locale` is listed in the `Languages` index
    pub fn is_supported(&self, locale: &str) -> bool {
        self.languages.contains_key(&normalize_locale(locale))
    }
}

/// Placeholder returned for missing translations
pub fn missing(key: &str) -> String {
    format!("[missing translation: {key}]")
}

/// Normalize locale code to its language part
///
/// - es-CL, es_CL, ES -> es
/// - en-US, en_US -> en
pub fn normalize_locale(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
