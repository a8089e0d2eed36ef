//! Import entry points.
//!
//! `import_usfm` and `import_html` parse a directory with the matching
//! [`BibleFormat`] and hand the records to the core [`Reconciler`]. Parsing
//! is blocking file I/O and runs on the blocking thread pool; verse writes
//! are issued sequentially.
//!
//! ```text
//! directory ──BibleFormat::parse──▶ ParseOutput ──Reconciler──▶ VerseStore
//! ```
//!
//! Input errors (missing directory, no matching files, unresolvable book,
//! nothing to import) are returned before any write happens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use lectio_core::books::BookResolver;
use lectio_core::canon::Canon;
use lectio_core::models::{ImportRequest, ImportResult, TranslationType};
use lectio_core::reconcile::{ImportProgress, NoProgress, Reconciler};
use lectio_core::store::VerseStore;

use crate::config::{Config, ImportConfig};
use crate::error::ImportError;
use crate::formats::{BibleFormat, HtmlFormat, UsfmFormat};
use crate::progress::ProgressMode;
use crate::sqlite_store::SqliteStore;

/// Shared import machinery: the canon, a resolver built from it, and the store.
#[derive(Clone)]
pub struct Importer {
    canon: Arc<Canon>,
    resolver: Arc<BookResolver>,
    config: ImportConfig,
    store: Arc<dyn VerseStore>,
    progress: Arc<dyn ImportProgress>,
}

impl Importer {
    pub fn new(canon: Arc<Canon>, config: ImportConfig, store: Arc<dyn VerseStore>) -> Self {
        let resolver = Arc::new(BookResolver::new(&canon));
        Self {
            canon,
            resolver,
            config,
            store,
            progress: Arc::new(NoProgress),
        }
    }

    /// Opens the configured SQLite store with the standard canon.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(config).await?;
        Ok(Self::new(
            Arc::new(Canon::standard()),
            config.import.clone(),
            Arc::new(store),
        ))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ImportProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn canon(&self) -> &Canon {
        &self.canon
    }

    pub fn resolver(&self) -> &BookResolver {
        &self.resolver
    }

    pub fn store(&self) -> &dyn VerseStore {
        self.store.as_ref()
    }

    /// Imports a directory of USFM files. `translation_type` defaults to the
    /// configured default.
    pub async fn import_usfm(
        &self,
        dir: &Path,
        language_code: &str,
        language_name: &str,
        translation_type: Option<TranslationType>,
    ) -> Result<ImportResult, ImportError> {
        self.import_with_format(UsfmFormat, dir, language_code, language_name, translation_type)
            .await
    }

    /// Imports a directory of per-chapter HTML files.
    pub async fn import_html(
        &self,
        dir: &Path,
        language_code: &str,
        language_name: &str,
        translation_type: Option<TranslationType>,
    ) -> Result<ImportResult, ImportError> {
        self.import_with_format(HtmlFormat, dir, language_code, language_name, translation_type)
            .await
    }

    pub async fn import_with_format<F>(
        &self,
        format: F,
        dir: &Path,
        language_code: &str,
        language_name: &str,
        translation_type: Option<TranslationType>,
    ) -> Result<ImportResult, ImportError>
    where
        F: BibleFormat + 'static,
    {
        let translation_type = translation_type.unwrap_or(self.config.default_translation_type);
        let request = ImportRequest::new(
            language_code,
            language_name,
            translation_type,
            self.config.is_base_language(language_code),
        );
        info!(
            format = format.name(),
            language = %request.language_code,
            translation_type = %request.translation_type,
            dir = %dir.display(),
            "starting import"
        );

        let resolver = Arc::clone(&self.resolver);
        let dir: PathBuf = dir.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || format.parse(&dir, &resolver))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))??;

        let reconciler = Reconciler::new(&self.canon, self.store.as_ref())
            .with_progress(self.progress.as_ref(), self.config.progress_every);
        Ok(reconciler.reconcile(&request, parsed).await?)
    }
}

/// Which directory format a CLI import reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Usfm,
    Html,
}

/// CLI entry point: imports, prints the result as JSON on stdout, and fails
/// when nothing was written.
pub async fn run_import(
    config: &Config,
    format: SourceFormat,
    dir: &Path,
    language_code: &str,
    language_name: Option<&str>,
    translation_type: Option<TranslationType>,
    progress: ProgressMode,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let store = Arc::new(store);
    let importer = Importer::new(
        Arc::new(Canon::standard()),
        config.import.clone(),
        store.clone(),
    )
    .with_progress(progress.reporter());

    let name = language_name.unwrap_or(language_code);
    let outcome = match format {
        SourceFormat::Usfm => {
            importer
                .import_usfm(dir, language_code, name, translation_type)
                .await
        }
        SourceFormat::Html => {
            importer
                .import_html(dir, language_code, name, translation_type)
                .await
        }
    };
    store.close().await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if let Some(partial) = e.partial() {
                println!("{}", serde_json::to_string_pretty(partial)?);
            }
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.total_processed() == 0 {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::models::ImportStatus;
    use lectio_core::store::memory::InMemoryStore;
    use tempfile::TempDir;

    fn importer(store: Arc<InMemoryStore>) -> Importer {
        Importer::new(Arc::new(Canon::standard()), ImportConfig::default(), store)
    }

    #[tokio::test]
    async fn test_import_usfm_defaults_to_configured_type() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.usfm"), "\\id RUT\n\\c 1\n\\v 1 Ruth.\n").unwrap();

        let store = Arc::new(InMemoryStore::new());
        let result = importer(store.clone())
            .import_usfm(dir.path(), "Test Lang", "", None)
            .await
            .unwrap();

        assert_eq!(result.status, ImportStatus::Complete);
        assert_eq!(result.language_code, "test_lang");
        let lang = store.get_language("test_lang").await.unwrap().unwrap();
        assert_eq!(lang.language_name, "test_lang");
        assert_eq!(lang.translation_levels.human.verses_translated, 1);
    }

    #[tokio::test]
    async fn test_base_language_writes_english_text() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.usfm"), "\\id RUT\n\\c 1\n\\v 1 Ruth.\n").unwrap();

        let store = Arc::new(InMemoryStore::new());
        importer(store.clone())
            .import_usfm(dir.path(), "English", "English", Some(TranslationType::Human))
            .await
            .unwrap();

        let verses = store
            .chapter_verses("english", "ruth", 1, TranslationType::Human)
            .await
            .unwrap();
        assert_eq!(verses[0].english_text.as_deref(), Some("Ruth."));
        assert!(verses[0].translated_text.is_none());
    }

    #[tokio::test]
    async fn test_input_error_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let err = importer(store.clone())
            .import_html(Path::new("/nonexistent/html"), "test", "Test", None)
            .await
            .unwrap_err();
        assert!(err.is_input_error());
        assert_eq!(store.verse_count(), 0);
        assert!(store.get_language("test").await.unwrap().is_none());
    }
}
