//! Import reconciliation: the shared write path behind every importer.
//!
//! Given parser output and an [`ImportRequest`], the [`Reconciler`]:
//!
//! 1. records whether the language already existed (`is_reimport`);
//! 2. checks each verse against the [`Canon`] and skips out-of-range records
//!    with an error entry;
//! 3. upserts every remaining verse on its composite key, sequentially;
//! 4. recomputes the language's progress counters for the imported level
//!    from what is now stored, creating the language document if needed.
//!
//! Each verse write is independent. A store failure stops the batch and is
//! returned as [`ReconcileError::Storage`] with the counts so far; verses
//! already written stay valid and the import can simply be re-run.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::canon::Canon;
use crate::error::ReconcileError;
use crate::models::{
    ImportRequest, ImportResult, LanguageUpdate, LevelProgress, ParseOutput, UpsertOutcome,
    VerseKey, VerseWrite,
};
use crate::store::VerseStore;

/// A single import progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportProgressEvent {
    /// `n` of `total` parsed verses handled so far.
    Writing {
        language_code: String,
        n: u64,
        total: u64,
    },
    Finished {
        language_code: String,
        imported: u64,
        updated: u64,
        errors: u64,
    },
}

/// Receives progress events from the reconciler.
pub trait ImportProgress: Send + Sync {
    fn report(&self, event: ImportProgressEvent);
}

/// Discards progress.
pub struct NoProgress;

impl ImportProgress for NoProgress {
    fn report(&self, _event: ImportProgressEvent) {}
}

/// Recomputes one level's counters from stored per-book verse counts.
///
/// Books outside the canon are ignored. A book is completed when its stored
/// count reaches the canonical verse count.
pub fn level_progress(canon: &Canon, book_counts: &[(String, u64)], at: DateTime<Utc>) -> LevelProgress {
    let mut progress = LevelProgress {
        last_updated: Some(at),
        ..LevelProgress::default()
    };
    for (code, count) in book_counts {
        let Ok(book) = canon.book(code) else {
            continue;
        };
        if *count == 0 {
            continue;
        }
        progress.books_started += 1;
        if *count >= u64::from(book.total_verses()) {
            progress.books_completed += 1;
        }
        progress.verses_translated += count;
    }
    progress
}

pub struct Reconciler<'a> {
    canon: &'a Canon,
    store: &'a dyn VerseStore,
    progress: &'a dyn ImportProgress,
    progress_every: u64,
}

impl<'a> Reconciler<'a> {
    pub fn new(canon: &'a Canon, store: &'a dyn VerseStore) -> Self {
        Self {
            canon,
            store,
            progress: &NoProgress,
            progress_every: 500,
        }
    }

    /// Reports progress every `every` verses (and once at the end).
    pub fn with_progress(mut self, progress: &'a dyn ImportProgress, every: u64) -> Self {
        self.progress = progress;
        self.progress_every = every.max(1);
        self
    }

    pub async fn reconcile(
        &self,
        request: &ImportRequest,
        parsed: ParseOutput,
    ) -> Result<ImportResult, ReconcileError> {
        let code = request.language_code.as_str();
        let existing = match self.store.get_language(code).await {
            Ok(existing) => existing,
            Err(cause) => {
                let partial = ImportResult::begin(code, parsed.unit, parsed.units, false);
                return Err(storage_failure(partial, cause));
            }
        };

        let mut result = ImportResult::begin(code, parsed.unit, parsed.units, existing.is_some());
        for issue in parsed.issues {
            warn!(language = code, "{}", issue);
            result.errors.push(issue);
        }

        let total = parsed.verses.len() as u64;
        for (i, verse) in parsed.verses.into_iter().enumerate() {
            if let Err(e) = self
                .canon
                .check_reference(&verse.book_code, verse.chapter, verse.verse)
            {
                warn!(language = code, "skipping verse: {}", e);
                result.errors.push(e.to_string());
                continue;
            }

            let write = VerseWrite {
                key: VerseKey {
                    language_code: code.to_string(),
                    book_code: verse.book_code,
                    chapter: verse.chapter,
                    verse: verse.verse,
                    translation_type: request.translation_type,
                },
                text: verse.text,
                is_base_language: request.is_base_language,
                at: Utc::now(),
            };
            match self.store.upsert_verse(&write).await {
                Ok(UpsertOutcome::Inserted) => result.verses_imported += 1,
                Ok(UpsertOutcome::Updated) => result.verses_updated += 1,
                Err(cause) => return Err(storage_failure(result, cause)),
            }

            let n = i as u64 + 1;
            if n % self.progress_every == 0 {
                self.progress.report(ImportProgressEvent::Writing {
                    language_code: code.to_string(),
                    n,
                    total,
                });
            }
        }

        if result.total_processed() > 0 {
            if let Err(cause) = self.refresh_language(request).await {
                return Err(storage_failure(result, cause));
            }
        } else {
            debug!(language = code, "nothing written; language document untouched");
        }

        let result = result.finish();
        info!(
            language = code,
            imported = result.verses_imported,
            updated = result.verses_updated,
            errors = result.errors.len(),
            reimport = result.is_reimport,
            "{}",
            result.message
        );
        self.progress.report(ImportProgressEvent::Finished {
            language_code: code.to_string(),
            imported: result.verses_imported,
            updated: result.verses_updated,
            errors: result.errors.len() as u64,
        });
        Ok(result)
    }

    async fn refresh_language(&self, request: &ImportRequest) -> anyhow::Result<()> {
        let counts = self
            .store
            .book_verse_counts(&request.language_code, request.translation_type)
            .await?;
        let now = Utc::now();
        let update = LanguageUpdate {
            language_code: request.language_code.clone(),
            language_name: request.language_name.clone(),
            is_base_language: request.is_base_language,
            translation_type: request.translation_type,
            progress: level_progress(self.canon, &counts, now),
            at: now,
        };
        self.store.upsert_language(&update).await?;
        Ok(())
    }
}

fn storage_failure(partial: ImportResult, cause: anyhow::Error) -> ReconcileError {
    let partial = partial.finish();
    warn!(
        language = partial.language_code.as_str(),
        written = partial.total_processed(),
        "storage failure mid-import: {:#}",
        cause
    );
    ReconcileError::Storage {
        partial: Box::new(partial),
        cause,
    }
}
