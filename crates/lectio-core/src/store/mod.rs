//! Storage abstraction for verse and language documents.
//!
//! The [`VerseStore`] trait is the only contract the reconciler and the read
//! paths depend on. Backends must provide an atomic insert-or-update on the
//! composite verse key; a read-then-write emulation races between concurrent
//! imports.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    LanguageDocument, LanguageSummary, LanguageUpdate, TranslationType, UpsertOutcome,
    VerseDocument, VerseKey, VerseWrite,
};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_verse`](VerseStore::upsert_verse) | Insert or update one verse on its composite key |
/// | [`get_language`](VerseStore::get_language) | Fetch a language document |
/// | [`upsert_language`](VerseStore::upsert_language) | Create a language if absent and refresh one level |
/// | [`book_verse_counts`](VerseStore::book_verse_counts) | Stored verses per book for one language level |
/// | [`chapter_verses`](VerseStore::chapter_verses) | One chapter, ordered by verse |
/// | [`set_verified`](VerseStore::set_verified) | Reviewer verification flag |
/// | [`language_summaries`](VerseStore::language_summaries) | Totals and verification per language |
#[async_trait]
pub trait VerseStore: Send + Sync {
    /// Inserts the verse if its key is absent, otherwise replaces only the
    /// text field for the write's language kind and `updated_at`.
    /// `human_verified` and `created_at` are never touched by an update.
    async fn upsert_verse(&self, write: &VerseWrite) -> Result<UpsertOutcome>;

    async fn get_language(&self, language_code: &str) -> Result<Option<LanguageDocument>>;

    /// Creates the language with zeroed levels if absent, then replaces the
    /// counters of `update.translation_type` and refreshes `updated_at`.
    async fn upsert_language(&self, update: &LanguageUpdate) -> Result<LanguageDocument>;

    /// `(book_code, stored verse count)` for every book with at least one verse.
    async fn book_verse_counts(
        &self,
        language_code: &str,
        translation_type: TranslationType,
    ) -> Result<Vec<(String, u64)>>;

    async fn chapter_verses(
        &self,
        language_code: &str,
        book_code: &str,
        chapter: u32,
        translation_type: TranslationType,
    ) -> Result<Vec<VerseDocument>>;

    /// Sets `human_verified` and refreshes `updated_at`. Returns `false`
    /// when no verse has this key.
    async fn set_verified(&self, key: &VerseKey, verified: bool, at: DateTime<Utc>) -> Result<bool>;

    /// One summary per language document, ordered by language code.
    async fn language_summaries(&self) -> Result<Vec<LanguageSummary>>;
}
