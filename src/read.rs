//! Chapter reader and verification toggle.
//!
//! A chapter is read for one language and translation level and paired
//! with the base language's text for the same chapter, so a reviewer sees
//! source and translation side by side together with each verse's
//! `human_verified` flag. Base-language text is always looked up under the
//! `human` level.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use lectio_core::books::BookResolver;
use lectio_core::canon::Canon;
use lectio_core::models::{normalize_language_code, TranslationType, VerseKey};
use lectio_core::store::VerseStore;

use crate::config::Config;
use crate::error::LookupError;
use crate::import::Importer;

/// One verse of a chapter view.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterVerse {
    pub verse: u32,
    pub text: Option<String>,
    /// Base-language text for the same reference.
    pub english_text: Option<String>,
    pub human_verified: bool,
}

/// One chapter of a language, paired with the base language.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterView {
    pub language_code: String,
    pub book_code: String,
    pub book_name: String,
    pub chapter: u32,
    pub translation_type: TranslationType,
    pub verses: Vec<ChapterVerse>,
}

/// Result of a verification toggle.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationUpdate {
    pub language_code: String,
    pub book_code: String,
    pub chapter: u32,
    pub verse: u32,
    pub translation_type: TranslationType,
    pub human_verified: bool,
}

pub struct Reader<'a> {
    canon: &'a Canon,
    resolver: &'a BookResolver,
    store: &'a dyn VerseStore,
    base_language: String,
}

impl<'a> Reader<'a> {
    pub fn new(
        canon: &'a Canon,
        resolver: &'a BookResolver,
        store: &'a dyn VerseStore,
        base_language: &str,
    ) -> Self {
        Self {
            canon,
            resolver,
            store,
            base_language: normalize_language_code(base_language),
        }
    }

    pub fn from_importer(importer: &'a Importer, base_language: &str) -> Self {
        Self::new(
            importer.canon(),
            importer.resolver(),
            importer.store(),
            base_language,
        )
    }

    /// Resolves `book` and checks the chapter exists in the canon.
    fn locate(&self, book: &str, chapter: u32) -> Result<&'static str, LookupError> {
        let code = self.resolver.resolve(book)?;
        self.canon.check_reference(code, chapter, 1)?;
        Ok(code)
    }

    pub async fn read_chapter(
        &self,
        language: &str,
        book: &str,
        chapter: u32,
        translation_type: TranslationType,
    ) -> Result<ChapterView, LookupError> {
        let language_code = normalize_language_code(language);
        let book_code = self.locate(book, chapter)?;

        let verses = self
            .store
            .chapter_verses(&language_code, book_code, chapter, translation_type)
            .await?;
        if verses.is_empty() {
            return Err(LookupError::NotFound(format!(
                "no {} verses for {} {} {}",
                translation_type, language_code, book_code, chapter
            )));
        }

        let base: HashMap<u32, String> = if language_code == self.base_language {
            HashMap::new()
        } else {
            self.store
                .chapter_verses(&self.base_language, book_code, chapter, TranslationType::Human)
                .await?
                .into_iter()
                .filter_map(|doc| doc.english_text.map(|text| (doc.verse, text)))
                .collect()
        };

        let book_name = self.canon.book(book_code)?.name.to_string();
        let verses = verses
            .into_iter()
            .map(|doc| ChapterVerse {
                verse: doc.verse,
                text: doc.text().map(str::to_string),
                english_text: doc
                    .english_text
                    .clone()
                    .or_else(|| base.get(&doc.verse).cloned()),
                human_verified: doc.human_verified,
            })
            .collect();

        Ok(ChapterView {
            language_code,
            book_code: book_code.to_string(),
            book_name,
            chapter,
            translation_type,
            verses,
        })
    }

    pub async fn set_verification(
        &self,
        language: &str,
        book: &str,
        chapter: u32,
        verse: u32,
        translation_type: TranslationType,
        verified: bool,
    ) -> Result<VerificationUpdate, LookupError> {
        let book_code = self.resolver.resolve(book)?;
        self.canon.check_reference(book_code, chapter, verse)?;

        let key = VerseKey {
            language_code: normalize_language_code(language),
            book_code: book_code.to_string(),
            chapter,
            verse,
            translation_type,
        };
        if !self.store.set_verified(&key, verified, Utc::now()).await? {
            return Err(LookupError::NotFound(format!(
                "verse not found: {} {} {}:{} ({})",
                key.language_code, key.book_code, chapter, verse, translation_type
            )));
        }
        Ok(VerificationUpdate {
            language_code: key.language_code,
            book_code: key.book_code,
            chapter,
            verse,
            translation_type,
            human_verified: verified,
        })
    }
}

/// CLI: `lectio read`.
pub async fn run_read(
    config: &Config,
    language: &str,
    book: &str,
    chapter: u32,
    translation_type: Option<TranslationType>,
) -> Result<()> {
    let importer = Importer::open(config).await?;
    let reader = Reader::from_importer(&importer, &config.import.base_language);
    let tt = translation_type.unwrap_or(config.import.default_translation_type);
    let view = reader.read_chapter(language, book, chapter, tt).await?;

    println!("{} {} ({}, {})", view.book_name, view.chapter, view.language_code, view.translation_type);
    println!();
    for v in &view.verses {
        let mark = if v.human_verified { "✓" } else { " " };
        println!("{:>3} {} {}", v.verse, mark, v.text.as_deref().unwrap_or(""));
        if let Some(base) = v.english_text.as_deref().filter(|b| Some(*b) != v.text.as_deref()) {
            println!("        {}", base);
        }
    }
    Ok(())
}

/// CLI: `lectio verify`.
pub async fn run_verify(
    config: &Config,
    language: &str,
    book: &str,
    chapter: u32,
    verse: u32,
    translation_type: Option<TranslationType>,
    verified: bool,
) -> Result<()> {
    let importer = Importer::open(config).await?;
    let reader = Reader::from_importer(&importer, &config.import.base_language);
    let tt = translation_type.unwrap_or(config.import.default_translation_type);
    let update = reader
        .set_verification(language, book, chapter, verse, tt, verified)
        .await?;
    println!("{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::models::VerseWrite;
    use lectio_core::store::memory::InMemoryStore;

    async fn put(store: &InMemoryStore, lang: &str, book: &str, verse: u32, text: &str, base: bool) {
        store
            .upsert_verse(&VerseWrite {
                key: VerseKey {
                    language_code: lang.to_string(),
                    book_code: book.to_string(),
                    chapter: 1,
                    verse,
                    translation_type: TranslationType::Human,
                },
                text: text.to_string(),
                is_base_language: base,
                at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_chapter_pairs_base_text() {
        let canon = Canon::standard();
        let resolver = BookResolver::new(&canon);
        let store = InMemoryStore::new();
        put(&store, "english", "john", 1, "In the beginning was the Word", true).await;
        put(&store, "english", "john", 2, "The same was in the beginning", true).await;
        put(&store, "spanish", "john", 1, "En el principio era el Verbo", false).await;

        let reader = Reader::new(&canon, &resolver, &store, "english");
        let view = reader
            .read_chapter("Spanish", "JHN", 1, TranslationType::Human)
            .await
            .unwrap();
        assert_eq!(view.book_code, "john");
        assert_eq!(view.book_name, "John");
        assert_eq!(view.verses.len(), 1);
        assert_eq!(view.verses[0].text.as_deref(), Some("En el principio era el Verbo"));
        assert_eq!(
            view.verses[0].english_text.as_deref(),
            Some("In the beginning was the Word")
        );
        assert!(!view.verses[0].human_verified);
    }

    #[tokio::test]
    async fn test_read_missing_chapter_is_not_found() {
        let canon = Canon::standard();
        let resolver = BookResolver::new(&canon);
        let store = InMemoryStore::new();
        let reader = Reader::new(&canon, &resolver, &store, "english");

        let err = reader
            .read_chapter("spanish", "john", 1, TranslationType::Human)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));

        let err = reader
            .read_chapter("spanish", "john", 22, TranslationType::Human)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::OutOfRange(_)));

        let err = reader
            .read_chapter("spanish", "XYZ", 1, TranslationType::Human)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::UnknownBook(_)));
    }

    #[tokio::test]
    async fn test_set_verification() {
        let canon = Canon::standard();
        let resolver = BookResolver::new(&canon);
        let store = InMemoryStore::new();
        put(&store, "spanish", "ruth", 1, "texto", false).await;
        let reader = Reader::new(&canon, &resolver, &store, "english");

        let update = reader
            .set_verification("spanish", "Ruth", 1, 1, TranslationType::Human, true)
            .await
            .unwrap();
        assert!(update.human_verified);
        let view = reader
            .read_chapter("spanish", "ruth", 1, TranslationType::Human)
            .await
            .unwrap();
        assert!(view.verses[0].human_verified);

        let err = reader
            .set_verification("spanish", "ruth", 1, 2, TranslationType::Human, true)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }
}
