//! Core data models.
//!
//! These types flow through the whole pipeline:
//!
//! ```text
//! source text ──parse──▶ ParsedVerse ──reconcile──▶ VerseWrite ──store──▶ VerseDocument
//!                                          │
//!                                          └──▶ LanguageUpdate ──store──▶ LanguageDocument
//! ```
//!
//! [`ImportResult`] is the value handed back to the caller (CLI or HTTP) and
//! is never persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content tier of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationType {
    /// Curated by people.
    #[default]
    Human,
    /// Machine generated.
    Ai,
}

impl TranslationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationType::Human => "human",
            TranslationType::Ai => "ai",
        }
    }
}

impl fmt::Display for TranslationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(TranslationType::Human),
            "ai" => Ok(TranslationType::Ai),
            other => anyhow::bail!("unknown translation type '{}' (expected human or ai)", other),
        }
    }
}

/// Lowercases a language code and turns spaces and hyphens into underscores.
pub fn normalize_language_code(code: &str) -> String {
    code.trim().to_lowercase().replace([' ', '-'], "_")
}

/// One verse produced by a parser. `text` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerse {
    pub book_code: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl ParsedVerse {
    pub fn new(book_code: impl Into<String>, chapter: u32, verse: u32, text: impl Into<String>) -> Self {
        Self {
            book_code: book_code.into(),
            chapter,
            verse,
            text: text.into(),
        }
    }
}

/// What a parser's unit count refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessedUnit {
    /// Distinct books seen (USFM).
    Books,
    /// Chapter files read (HTML).
    Chapters,
}

impl ProcessedUnit {
    pub fn noun(&self) -> &'static str {
        match self {
            ProcessedUnit::Books => "books",
            ProcessedUnit::Chapters => "chapters",
        }
    }
}

/// Output of a full parse pass over a source.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// Records in reading order.
    pub verses: Vec<ParsedVerse>,
    pub unit: ProcessedUnit,
    pub units: usize,
    /// Skip-and-record entries for malformed input (unmatched notes and the like).
    pub issues: Vec<String>,
}

impl ParseOutput {
    pub fn new(unit: ProcessedUnit) -> Self {
        Self {
            verses: Vec::new(),
            unit,
            units: 0,
            issues: Vec::new(),
        }
    }
}

/// Composite identity of a stored verse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseKey {
    pub language_code: String,
    pub book_code: String,
    pub chapter: u32,
    pub verse: u32,
    pub translation_type: TranslationType,
}

/// A single conditional write issued by the reconciler.
#[derive(Debug, Clone)]
pub struct VerseWrite {
    pub key: VerseKey,
    pub text: String,
    /// Base-language text is stored as `english_text`, everything else as
    /// `translated_text`.
    pub is_base_language: bool,
    pub at: DateTime<Utc>,
}

impl VerseWrite {
    pub fn english_text(&self) -> Option<&str> {
        self.is_base_language.then_some(self.text.as_str())
    }

    pub fn translated_text(&self) -> Option<&str> {
        (!self.is_base_language).then_some(self.text.as_str())
    }
}

/// Whether an upsert created the document or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A persisted verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseDocument {
    pub language_code: String,
    pub book_code: String,
    pub chapter: u32,
    pub verse: u32,
    pub translation_type: TranslationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    pub human_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VerseDocument {
    /// Translated text if present, else the base text.
    pub fn text(&self) -> Option<&str> {
        self.translated_text
            .as_deref()
            .or(self.english_text.as_deref())
    }
}

/// Progress counters for one translation level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub books_started: u32,
    pub books_completed: u32,
    pub verses_translated: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationLevels {
    pub human: LevelProgress,
    pub ai: LevelProgress,
}

impl TranslationLevels {
    pub fn get(&self, translation_type: TranslationType) -> &LevelProgress {
        match translation_type {
            TranslationType::Human => &self.human,
            TranslationType::Ai => &self.ai,
        }
    }

    pub fn get_mut(&mut self, translation_type: TranslationType) -> &mut LevelProgress {
        match translation_type {
            TranslationType::Human => &mut self.human,
            TranslationType::Ai => &mut self.ai,
        }
    }
}

/// One document per language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDocument {
    pub language_code: String,
    pub language_name: String,
    pub is_base_language: bool,
    pub status: String,
    pub translation_levels: TranslationLevels,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Refresh of one level's counters, creating the language if absent.
#[derive(Debug, Clone)]
pub struct LanguageUpdate {
    pub language_code: String,
    pub language_name: String,
    pub is_base_language: bool,
    pub translation_type: TranslationType,
    pub progress: LevelProgress,
    pub at: DateTime<Utc>,
}

/// Per-language totals for overview listings.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub language_code: String,
    pub language_name: String,
    pub is_base_language: bool,
    pub total_verses: u64,
    pub verified_count: u64,
    /// Percentage, rounded to one decimal place.
    pub verification_progress: f64,
}

impl LanguageSummary {
    pub fn verification_percent(verified: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (verified as f64 * 1000.0 / total as f64).round() / 10.0
    }
}

/// Target of one import invocation.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub language_code: String,
    pub language_name: String,
    pub translation_type: TranslationType,
    pub is_base_language: bool,
}

impl ImportRequest {
    /// Normalizes the code; an empty name falls back to the code.
    pub fn new(
        language_code: &str,
        language_name: &str,
        translation_type: TranslationType,
        is_base_language: bool,
    ) -> Self {
        let language_code = normalize_language_code(language_code);
        let language_name = if language_name.trim().is_empty() {
            language_code.clone()
        } else {
            language_name.trim().to_string()
        };
        Self {
            language_code,
            language_name,
            translation_type,
            is_base_language,
        }
    }
}

/// Outcome class of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Nothing to import.
    Empty,
    /// Records were attempted but none were written.
    Failed,
    /// Some records written, some rejected.
    Partial,
    Complete,
}

/// Response value of an import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub status: ImportStatus,
    pub language_code: String,
    pub message: String,
    pub verses_imported: u64,
    pub verses_updated: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapters_processed: Option<usize>,
    pub is_reimport: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ImportResult {
    /// Empty result for a batch that is about to start.
    pub fn begin(language_code: &str, unit: ProcessedUnit, units: usize, is_reimport: bool) -> Self {
        let (books_processed, chapters_processed) = match unit {
            ProcessedUnit::Books => (Some(units), None),
            ProcessedUnit::Chapters => (None, Some(units)),
        };
        Self {
            success: false,
            status: ImportStatus::Empty,
            language_code: language_code.to_string(),
            message: String::new(),
            verses_imported: 0,
            verses_updated: 0,
            books_processed,
            chapters_processed,
            is_reimport,
            errors: Vec::new(),
        }
    }

    pub fn total_processed(&self) -> u64 {
        self.verses_imported + self.verses_updated
    }

    fn units(&self) -> (usize, &'static str) {
        match (self.books_processed, self.chapters_processed) {
            (_, Some(chapters)) => (chapters, "chapters"),
            (Some(books), None) => (books, "books"),
            (None, None) => (0, "books"),
        }
    }

    /// Sets `status`, `success` and `message` from the counters.
    pub fn finish(mut self) -> Self {
        let written = self.total_processed();
        self.status = match (written, self.errors.is_empty()) {
            (0, true) => ImportStatus::Empty,
            (0, false) => ImportStatus::Failed,
            (_, false) => ImportStatus::Partial,
            (_, true) => ImportStatus::Complete,
        };
        self.success = matches!(self.status, ImportStatus::Partial | ImportStatus::Complete);

        let (units, noun) = self.units();
        self.message = match self.status {
            ImportStatus::Empty => "No verses found to import".to_string(),
            ImportStatus::Failed => format!(
                "No verses imported; {} records failed validation",
                self.errors.len()
            ),
            _ if self.verses_updated == 0 => format!(
                "Imported {} verses from {} {}",
                self.verses_imported, units, noun
            ),
            _ if self.verses_imported == 0 => format!(
                "Updated {} existing verses in {} {}",
                self.verses_updated, units, noun
            ),
            _ => format!(
                "Imported {} new verses, updated {} existing verses across {} {}",
                self.verses_imported, self.verses_updated, units, noun
            ),
        };
        self
    }
}
