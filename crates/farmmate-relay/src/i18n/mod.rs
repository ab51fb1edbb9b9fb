//! Localization lookup.
//!
//! Resolution never fails:
//! 1. an unsupported language tag resolves to [`Language::DEFAULT`]
//! 2. a key missing in the requested language resolves in the default language
//! 3. a key missing everywhere resolves to the caller's literal fallback

mod tables;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages the relay can answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (default).
    #[default]
    En,
    /// Hindi.
    Hi,
    /// Marathi.
    Mr,
    /// Gujarati.
    Gu,
    /// Punjabi.
    Pa,
}

impl Language {
    /// Fallback language for unsupported tags and missing translations.
    pub const DEFAULT: Self = Self::En;

    /// Every supported language, in catalog column order.
    pub const ALL: [Self; 5] = [Self::En, Self::Hi, Self::Mr, Self::Gu, Self::Pa];

    /// Canonical tag (`"en"`, `"hi"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Mr => "mr",
            Self::Gu => "gu",
            Self::Pa => "pa",
        }
    }

    /// Name of the language in its own script.
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "हिंदी",
            Self::Mr => "मराठी",
            Self::Gu => "ગુજરાતી",
            Self::Pa => "ਪੰਜਾਬੀ",
        }
    }

    /// Parse a tag, case-insensitive and tolerant of region suffixes (`hi-IN`).
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_ascii_lowercase();
        let primary = normalized.split(['-', '_']).next().unwrap_or("");
        Self::ALL.into_iter().find(|lang| lang.as_str() == primary)
    }

    /// Parse an optional tag, falling back to [`Language::DEFAULT`].
    pub fn resolve(tag: Option<&str>) -> Self {
        tag.and_then(Self::parse).unwrap_or(Self::DEFAULT)
    }

    const fn column(self) -> usize {
        match self {
            Self::En => 0,
            Self::Hi => 1,
            Self::Mr => 2,
            Self::Gu => 3,
            Self::Pa => 4,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String table a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Transient progress messages (`ai_status`).
    Status,
    /// Labels used when rendering replies.
    Label,
    /// Client-facing error messages.
    Error,
}

/// English text used when even the generic processing error is missing.
const PROCESSING_ERROR_FALLBACK: &str = "Processing error occurred. Please try again.";

/// Display-string resolution by (category, key, language).
pub trait Localizer: Send + Sync {
    /// Resolve a string. Must never fail: degrade to the default language,
    /// then to `fallback`.
    fn lookup(&self, category: Category, key: &str, language: &str, fallback: &str) -> String;

    /// Whether `language` names a supported language.
    fn is_supported(&self, language: &str) -> bool {
        Language::parse(language).is_some()
    }

    /// Progress message for `key` (`messageReceived`, `analyzingQuery`, ...).
    fn status_message(&self, key: &str, language: Language) -> String {
        let generic = self.lookup(Category::Status, "processing", language.as_str(), "Processing...");
        self.lookup(Category::Status, key, language.as_str(), &generic)
    }

    /// Rendering label for `key`; unknown keys render as the key itself.
    fn label(&self, key: &str, language: Language) -> String {
        self.lookup(Category::Label, key, language.as_str(), key)
    }

    /// Error message for `key`; unknown keys render the generic processing error.
    fn error_message(&self, key: &str, language: Language) -> String {
        let generic = self.lookup(
            Category::Error,
            "processingError",
            language.as_str(),
            PROCESSING_ERROR_FALLBACK,
        );
        self.lookup(Category::Error, key, language.as_str(), &generic)
    }
}

/// One catalog row: a translation per [`Language::ALL`] column, `""` when missing.
type Row = [&'static str; 5];

/// Built-in string catalog.
pub struct Catalog {
    tables: HashMap<Category, HashMap<&'static str, Row>>,
}

impl Catalog {
    /// Catalog loaded with the compiled-in status, label and error tables.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.extend(Category::Status, tables::STATUS);
        catalog.extend(Category::Label, tables::LABELS);
        catalog.extend(Category::Error, tables::ERRORS);
        catalog
    }

    /// Catalog with no entries; every lookup returns its fallback.
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Add (or replace) rows for a category.
    pub fn extend(&mut self, category: Category, rows: &[(&'static str, Row)]) {
        let table = self.tables.entry(category).or_default();
        for (key, row) in rows {
            let _ = table.insert(*key, *row);
        }
    }

    fn row(&self, category: Category, key: &str) -> Option<&Row> {
        self.tables.get(&category)?.get(key)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Localizer for Catalog {
    fn lookup(&self, category: Category, key: &str, language: &str, fallback: &str) -> String {
        let language = Language::resolve(Some(language));
        let Some(row) = self.row(category, key) else {
            return fallback.to_owned();
        };
        [language, Language::DEFAULT]
            .into_iter()
            .map(|lang| row[lang.column()])
            .find(|text| !text.is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
