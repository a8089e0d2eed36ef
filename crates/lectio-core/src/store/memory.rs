//! In-memory [`VerseStore`] for tests and embedding.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. The verse map lock is held
//! across the whole check-and-write, which makes each upsert atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    LanguageDocument, LanguageSummary, LanguageUpdate, TranslationLevels, TranslationType,
    UpsertOutcome, VerseDocument, VerseKey, VerseWrite,
};

use super::VerseStore;

#[derive(Default)]
pub struct InMemoryStore {
    verses: RwLock<HashMap<VerseKey, VerseDocument>>,
    languages: RwLock<HashMap<String, LanguageDocument>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored verse documents across all languages.
    pub fn verse_count(&self) -> usize {
        self.verses.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Direct lookup by key, for assertions.
    pub fn get_verse(&self, key: &VerseKey) -> Option<VerseDocument> {
        self.verses.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl VerseStore for InMemoryStore {
    async fn upsert_verse(&self, w: &VerseWrite) -> Result<UpsertOutcome> {
        let mut verses = write(&self.verses)?;
        if let Some(doc) = verses.get_mut(&w.key) {
            if w.is_base_language {
                doc.english_text = Some(w.text.clone());
            } else {
                doc.translated_text = Some(w.text.clone());
            }
            doc.updated_at = w.at;
            return Ok(UpsertOutcome::Updated);
        }
        verses.insert(
            w.key.clone(),
            VerseDocument {
                language_code: w.key.language_code.clone(),
                book_code: w.key.book_code.clone(),
                chapter: w.key.chapter,
                verse: w.key.verse,
                translation_type: w.key.translation_type,
                english_text: w.english_text().map(str::to_string),
                translated_text: w.translated_text().map(str::to_string),
                human_verified: false,
                created_at: w.at,
                updated_at: w.at,
            },
        );
        Ok(UpsertOutcome::Inserted)
    }

    async fn get_language(&self, language_code: &str) -> Result<Option<LanguageDocument>> {
        Ok(read(&self.languages)?.get(language_code).cloned())
    }

    async fn upsert_language(&self, update: &LanguageUpdate) -> Result<LanguageDocument> {
        let mut languages = write(&self.languages)?;
        let doc = languages
            .entry(update.language_code.clone())
            .or_insert_with(|| LanguageDocument {
                language_code: update.language_code.clone(),
                language_name: update.language_name.clone(),
                is_base_language: update.is_base_language,
                status: "active".to_string(),
                translation_levels: TranslationLevels::default(),
                created_at: update.at,
                updated_at: update.at,
            });
        *doc.translation_levels.get_mut(update.translation_type) = update.progress.clone();
        doc.updated_at = update.at;
        Ok(doc.clone())
    }

    async fn book_verse_counts(
        &self,
        language_code: &str,
        translation_type: TranslationType,
    ) -> Result<Vec<(String, u64)>> {
        let verses = read(&self.verses)?;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for key in verses.keys() {
            if key.language_code == language_code && key.translation_type == translation_type {
                *counts.entry(key.book_code.clone()).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn chapter_verses(
        &self,
        language_code: &str,
        book_code: &str,
        chapter: u32,
        translation_type: TranslationType,
    ) -> Result<Vec<VerseDocument>> {
        let verses = read(&self.verses)?;
        let mut found: Vec<VerseDocument> = verses
            .values()
            .filter(|d| {
                d.language_code == language_code
                    && d.book_code == book_code
                    && d.chapter == chapter
                    && d.translation_type == translation_type
            })
            .cloned()
            .collect();
        found.sort_by_key(|d| d.verse);
        Ok(found)
    }

    async fn set_verified(&self, key: &VerseKey, verified: bool, at: DateTime<Utc>) -> Result<bool> {
        let mut verses = write(&self.verses)?;
        match verses.get_mut(key) {
            Some(doc) => {
                doc.human_verified = verified;
                doc.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn language_summaries(&self) -> Result<Vec<LanguageSummary>> {
        let languages = read(&self.languages)?;
        let verses = read(&self.verses)?;
        let mut summaries: Vec<LanguageSummary> = languages
            .values()
            .map(|lang| {
                let (total, verified) = verses
                    .values()
                    .filter(|d| d.language_code == lang.language_code)
                    .fold((0u64, 0u64), |(t, v), d| (t + 1, v + d.human_verified as u64));
                LanguageSummary {
                    language_code: lang.language_code.clone(),
                    language_name: lang.language_name.clone(),
                    is_base_language: lang.is_base_language,
                    total_verses: total,
                    verified_count: verified,
                    verification_progress: LanguageSummary::verification_percent(verified, total),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.language_code.cmp(&b.language_code));
        Ok(summaries)
    }
}
