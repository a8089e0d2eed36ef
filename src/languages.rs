//! Language overview: summaries across languages and per-book progress for one.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use lectio_core::canon::Canon;
use lectio_core::models::{
    normalize_language_code, LanguageDocument, LanguageSummary, LanguageUpdate, LevelProgress,
    TranslationType,
};
use lectio_core::store::VerseStore;

use crate::config::{Config, ImportConfig};
use crate::error::LookupError;
use crate::import::Importer;

/// Stored verse coverage of one book against the canon.
#[derive(Debug, Clone, Serialize)]
pub struct BookProgress {
    pub book_code: String,
    pub book_name: String,
    pub testament: &'static str,
    pub total_chapters: u32,
    pub verses_stored: u64,
    pub verses_total: u32,
    pub percent: f64,
    pub completed: bool,
}

pub async fn list_languages(store: &dyn VerseStore) -> Result<Vec<LanguageSummary>, LookupError> {
    Ok(store.language_summaries().await?)
}

pub async fn language_detail(
    store: &dyn VerseStore,
    language: &str,
) -> Result<LanguageDocument, LookupError> {
    let code = normalize_language_code(language);
    store
        .get_language(&code)
        .await?
        .ok_or_else(|| LookupError::NotFound(format!("language not found: {}", code)))
}

/// Per-book progress in canonical order. Books with no stored verses are omitted.
pub async fn book_progress(
    canon: &Canon,
    store: &dyn VerseStore,
    language: &str,
    translation_type: TranslationType,
) -> Result<Vec<BookProgress>, LookupError> {
    progress_rows(canon, store, language, translation_type, false).await
}

/// All 66 books in canonical order with their structure and stored progress.
pub async fn bible_books(
    canon: &Canon,
    store: &dyn VerseStore,
    language: &str,
    translation_type: TranslationType,
) -> Result<Vec<BookProgress>, LookupError> {
    progress_rows(canon, store, language, translation_type, true).await
}

async fn progress_rows(
    canon: &Canon,
    store: &dyn VerseStore,
    language: &str,
    translation_type: TranslationType,
    include_unstarted: bool,
) -> Result<Vec<BookProgress>, LookupError> {
    let code = language_detail(store, language).await?.language_code;
    let counts = store.book_verse_counts(&code, translation_type).await?;

    let mut progress = Vec::new();
    for book in canon.books() {
        let stored = counts
            .iter()
            .find(|(c, _)| c == book.code)
            .map(|(_, n)| *n);
        let stored = match stored {
            Some(n) => n,
            None if include_unstarted => 0,
            None => continue,
        };
        let total = book.total_verses();
        progress.push(BookProgress {
            book_code: book.code.to_string(),
            book_name: book.name.to_string(),
            testament: book.testament.as_str(),
            total_chapters: book.chapter_count(),
            verses_stored: stored,
            verses_total: total,
            percent: LanguageSummary::verification_percent(stored, u64::from(total)),
            completed: stored >= u64::from(total),
        });
    }
    Ok(progress)
}

/// Result of registering a language ahead of any import.
#[derive(Debug, Clone, Serialize)]
pub struct NewLanguage {
    /// False when the language already existed; its counters are left alone.
    pub created: bool,
    pub language: LanguageDocument,
}

fn valid_language_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
}

/// Creates a language document with zeroed levels. Names are limited to
/// ASCII letters, digits, spaces, hyphens and underscores.
pub async fn create_language(
    store: &dyn VerseStore,
    import: &ImportConfig,
    language_name: &str,
) -> Result<NewLanguage, LookupError> {
    if !valid_language_name(language_name) {
        return Err(LookupError::InvalidLanguage(language_name.to_string()));
    }
    let language_name = language_name.trim();
    let code = normalize_language_code(language_name);
    if let Some(existing) = store.get_language(&code).await? {
        return Ok(NewLanguage {
            created: false,
            language: existing,
        });
    }

    let language = store
        .upsert_language(&LanguageUpdate {
            language_code: code.clone(),
            language_name: language_name.to_string(),
            is_base_language: import.is_base_language(&code),
            translation_type: TranslationType::Human,
            progress: LevelProgress::default(),
            at: Utc::now(),
        })
        .await?;
    info!(language = %code, "created language");
    Ok(NewLanguage {
        created: true,
        language,
    })
}

/// CLI: `lectio new-language`.
pub async fn run_new_language(config: &Config, language_name: &str) -> Result<()> {
    let importer = Importer::open(config).await?;
    let result = create_language(importer.store(), &config.import, language_name).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// CLI: `lectio languages`.
pub async fn run_languages(config: &Config) -> Result<()> {
    let importer = Importer::open(config).await?;
    let summaries = list_languages(importer.store()).await?;

    if summaries.is_empty() {
        println!("No languages imported.");
        return Ok(());
    }
    println!(
        "{:<20} {:<24} {:>8} {:>9} {:>7}",
        "CODE", "NAME", "VERSES", "VERIFIED", "%"
    );
    for s in &summaries {
        let base = if s.is_base_language { " (base)" } else { "" };
        println!(
            "{:<20} {:<24} {:>8} {:>9} {:>6.1}%",
            s.language_code,
            format!("{}{}", s.language_name, base),
            s.total_verses,
            s.verified_count,
            s.verification_progress
        );
    }
    Ok(())
}

/// CLI: `lectio books`.
pub async fn run_books(
    config: &Config,
    language: &str,
    translation_type: Option<TranslationType>,
) -> Result<()> {
    let importer = Importer::open(config).await?;
    let tt = translation_type.unwrap_or(config.import.default_translation_type);
    let doc = language_detail(importer.store(), language).await?;
    let books = book_progress(importer.canon(), importer.store(), language, tt).await?;
    let level = doc.translation_levels.get(tt);

    println!("{} ({}), {} level", doc.language_name, doc.language_code, tt);
    println!(
        "  books started: {}  completed: {}  verses: {}",
        level.books_started, level.books_completed, level.verses_translated
    );
    println!();
    for b in &books {
        let mark = if b.completed { "done" } else { "" };
        println!(
            "  {:<18} {:>5} / {:<5} {:>6.1}% {}",
            b.book_name, b.verses_stored, b.verses_total, b.percent, mark
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lectio_core::models::{LanguageUpdate, LevelProgress, VerseKey, VerseWrite};
    use lectio_core::store::memory::InMemoryStore;

    async fn seed(store: &InMemoryStore) {
        for verse in 1..=22 {
            store
                .upsert_verse(&VerseWrite {
                    key: VerseKey {
                        language_code: "test".to_string(),
                        book_code: "ruth".to_string(),
                        chapter: 1,
                        verse,
                        translation_type: TranslationType::Human,
                    },
                    text: format!("verse {}", verse),
                    is_base_language: false,
                    at: Utc::now(),
                })
                .await
                .unwrap();
        }
        store
            .upsert_language(&LanguageUpdate {
                language_code: "test".to_string(),
                language_name: "Test".to_string(),
                is_base_language: false,
                translation_type: TranslationType::Human,
                progress: LevelProgress::default(),
                at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_book_progress_against_canon() {
        let canon = Canon::standard();
        let store = InMemoryStore::new();
        seed(&store).await;

        let books = book_progress(&canon, &store, "Test", TranslationType::Human)
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book_code, "ruth");
        assert_eq!(books[0].verses_stored, 22);
        assert_eq!(books[0].verses_total, 85);
        assert!(!books[0].completed);
        assert_eq!(books[0].percent, 25.9);
    }

    #[tokio::test]
    async fn test_bible_books_lists_whole_canon() {
        let canon = Canon::standard();
        let store = InMemoryStore::new();
        seed(&store).await;

        let books = bible_books(&canon, &store, "test", TranslationType::Human)
            .await
            .unwrap();
        assert_eq!(books.len(), 66);
        assert_eq!(books[0].book_code, "genesis");
        assert_eq!(books[0].total_chapters, 50);
        assert_eq!(books[0].verses_stored, 0);
        let ruth = books.iter().find(|b| b.book_code == "ruth").unwrap();
        assert_eq!(ruth.total_chapters, 4);
        assert_eq!(ruth.verses_stored, 22);
    }

    #[tokio::test]
    async fn test_create_language_zeroed_then_kept() {
        let store = InMemoryStore::new();
        let import = ImportConfig::default();

        let first = create_language(&store, &import, "Kope Dialect").await.unwrap();
        assert!(first.created);
        assert_eq!(first.language.language_code, "kope_dialect");
        assert_eq!(first.language.language_name, "Kope Dialect");
        assert_eq!(first.language.translation_levels.human.verses_translated, 0);
        assert_eq!(first.language.translation_levels.ai.books_started, 0);

        let second = create_language(&store, &import, "kope-dialect").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.language.language_name, "Kope Dialect");
    }

    #[tokio::test]
    async fn test_create_existing_language_keeps_counters() {
        let store = InMemoryStore::new();
        seed(&store).await;
        store
            .upsert_language(&LanguageUpdate {
                language_code: "test".to_string(),
                language_name: "Test".to_string(),
                is_base_language: false,
                translation_type: TranslationType::Human,
                progress: LevelProgress {
                    books_started: 1,
                    books_completed: 0,
                    verses_translated: 22,
                    last_updated: None,
                },
                at: Utc::now(),
            })
            .await
            .unwrap();

        let result = create_language(&store, &ImportConfig::default(), "Test")
            .await
            .unwrap();
        assert!(!result.created);
        assert_eq!(result.language.translation_levels.human.verses_translated, 22);
    }

    #[tokio::test]
    async fn test_create_language_rejects_bad_name() {
        let store = InMemoryStore::new();
        for name in ["", "   ", "Kope!", "fr/ca"] {
            let err = create_language(&store, &ImportConfig::default(), name)
                .await
                .unwrap_err();
            assert!(matches!(err, LookupError::InvalidLanguage(_)), "{name}");
        }
        assert!(list_languages(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_language_is_not_found() {
        let store = InMemoryStore::new();
        let err = language_detail(&store, "nowhere").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_languages() {
        let store = InMemoryStore::new();
        seed(&store).await;
        let summaries = list_languages(&store).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_verses, 22);
        assert_eq!(summaries[0].verified_count, 0);
    }
}
