//! Directory-level source formats.
//!
//! A [`BibleFormat`] turns a directory of source files into one
//! [`ParseOutput`]. Both formats list the directory (non-recursively), pick
//! their files by name, read them, and hand the content to the string
//! parsers in `lectio_core`. All input errors surface here, before the
//! reconciler writes anything.
//!
//! | Format | Files | Book identity | Unit counted |
//! |--------|-------|---------------|--------------|
//! | [`UsfmFormat`] | first of `*.usfm`, `*.SFM`, `*.sfm`, `*.USFM` with any match | `\id` marker | books |
//! | [`HtmlFormat`] | `{CODE}{NN}.htm` | file name | chapters |

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::Glob;
use tracing::debug;
use walkdir::WalkDir;

use lectio_core::books::BookResolver;
use lectio_core::error::UsfmError;
use lectio_core::html::{self, HtmlFileKind};
use lectio_core::models::{ParseOutput, ProcessedUnit};
use lectio_core::usfm;

use crate::error::ImportError;

/// USFM extensions in priority order.
pub const USFM_PATTERNS: [&str; 4] = ["*.usfm", "*.SFM", "*.sfm", "*.USFM"];

/// One source format, parsed from a directory.
pub trait BibleFormat: Send + Sync {
    fn name(&self) -> &'static str;

    fn unit(&self) -> ProcessedUnit;

    fn parse(&self, dir: &Path, resolver: &BookResolver) -> Result<ParseOutput, ImportError>;
}

/// USFM files, one book per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsfmFormat;

/// Per-chapter HTML files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormat;

fn check_dir(dir: &Path) -> Result<(), ImportError> {
    if !dir.exists() {
        return Err(ImportError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ImportError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// Regular files directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ImportError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Files matching the first USFM pattern that matches anything. Falls back
/// to `*.usfm`, which then matches nothing.
pub fn select_usfm_files(files: &[PathBuf]) -> Result<Vec<PathBuf>, ImportError> {
    for pattern in USFM_PATTERNS {
        let matcher = Glob::new(pattern)
            .map_err(|source| ImportError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();
        let matched: Vec<PathBuf> = files
            .iter()
            .filter(|p| matcher.is_match(file_name(p)))
            .cloned()
            .collect();
        if !matched.is_empty() {
            debug!(pattern, files = matched.len(), "selected USFM files");
            return Ok(matched);
        }
    }
    Ok(Vec::new())
}

fn read(path: &Path) -> Result<String, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

impl BibleFormat for UsfmFormat {
    fn name(&self) -> &'static str {
        "usfm"
    }

    fn unit(&self) -> ProcessedUnit {
        ProcessedUnit::Books
    }

    fn parse(&self, dir: &Path, resolver: &BookResolver) -> Result<ParseOutput, ImportError> {
        check_dir(dir)?;
        let files = select_usfm_files(&list_files(dir)?)?;

        let mut output = ParseOutput::new(ProcessedUnit::Books);
        let mut books = BTreeSet::new();
        for path in &files {
            let content = read(path)?;
            let book = usfm::parse_usfm(&content, resolver).map_err(|e| match e {
                UsfmError::MissingBookId => ImportError::MissingBookId { file: path.clone() },
                UsfmError::UnresolvedBook(source) => ImportError::UnresolvedBook {
                    file: path.clone(),
                    source,
                },
            })?;
            debug!(
                file = %path.display(),
                book = book.book_code,
                header = book.header.as_deref().unwrap_or(""),
                verses = book.verses.len(),
                "parsed USFM file"
            );
            books.insert(book.book_code);
            output.verses.extend(book.verses);
            output.issues.extend(
                book.issues
                    .into_iter()
                    .map(|issue| format!("{}: {}", file_name(path), issue)),
            );
        }

        if output.verses.is_empty() {
            return Err(ImportError::EmptyImport(dir.to_path_buf()));
        }
        output.units = books.len();
        Ok(output)
    }
}

impl BibleFormat for HtmlFormat {
    fn name(&self) -> &'static str {
        "html"
    }

    fn unit(&self) -> ProcessedUnit {
        ProcessedUnit::Chapters
    }

    fn parse(&self, dir: &Path, resolver: &BookResolver) -> Result<ParseOutput, ImportError> {
        check_dir(dir)?;

        let mut matching = 0usize;
        let mut chapters = Vec::new();
        for path in list_files(dir)? {
            let kind = html::classify_file_name(file_name(&path), resolver).map_err(|source| {
                ImportError::UnresolvedBook {
                    file: path.clone(),
                    source,
                }
            })?;
            if kind.matches_pattern() {
                matching += 1;
            }
            match kind {
                HtmlFileKind::Chapter { .. } => chapters.push(path),
                HtmlFileKind::Introduction => {
                    debug!(file = %path.display(), "skipping introduction")
                }
                HtmlFileKind::Ignored => {}
            }
        }
        if matching == 0 {
            return Err(ImportError::NoMatchingFiles {
                dir: dir.to_path_buf(),
                pattern: html::RE_CHAPTER_FILE_NAME.as_str().to_string(),
            });
        }

        let mut output = ParseOutput::new(ProcessedUnit::Chapters);
        for path in &chapters {
            let content = read(path)?;
            let parsed = html::parse_html_chapter(file_name(path), &content, resolver)
                .map_err(|source| ImportError::UnresolvedBook {
                    file: path.clone(),
                    source,
                })?;
            let Some(chapter) = parsed else {
                continue;
            };
            debug!(
                file = %path.display(),
                book = chapter.book_code,
                chapter = chapter.chapter,
                verses = chapter.verses.len(),
                "parsed HTML chapter"
            );
            if !chapter.verses.is_empty() {
                output.units += 1;
            }
            output.verses.extend(chapter.verses);
            output.issues.extend(chapter.issues);
        }

        if output.verses.is_empty() {
            return Err(ImportError::EmptyImport(dir.to_path_buf()));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_core::canon::Canon;
    use tempfile::TempDir;

    fn resolver() -> BookResolver {
        BookResolver::new(&Canon::standard())
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_usfm_pattern_priority() {
        let files: Vec<PathBuf> = ["a.SFM", "b.sfm", "c.USFM", "notes.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let selected = select_usfm_files(&files).unwrap();
        assert_eq!(selected, vec![PathBuf::from("a.SFM")]);

        let files = vec![PathBuf::from("x.usfm"), PathBuf::from("y.SFM")];
        assert_eq!(select_usfm_files(&files).unwrap(), vec![PathBuf::from("x.usfm")]);

        assert!(select_usfm_files(&[PathBuf::from("readme.md")]).unwrap().is_empty());
    }

    #[test]
    fn test_usfm_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, "01-GEN.usfm", "\\id GEN\n\\c 1\n\\v 1 Text one.\n\\v 2 Text two.\n");
        write(&dir, "02-EXO.usfm", "\\id EXO\n\\c 1\n\\v 1 Text three.\n");
        write(&dir, "ignored.SFM", "\\id LEV\n\\c 1\n\\v 1 Not read.\n");

        let output = UsfmFormat.parse(dir.path(), &resolver()).unwrap();
        assert_eq!(output.verses.len(), 3);
        assert_eq!(output.units, 2);
        assert_eq!(output.unit, ProcessedUnit::Books);
    }

    #[test]
    fn test_usfm_missing_directory() {
        let err = UsfmFormat
            .parse(Path::new("/nonexistent/usfm"), &resolver())
            .unwrap_err();
        assert!(matches!(err, ImportError::DirectoryNotFound(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_usfm_empty_directory_is_empty_import() {
        let dir = TempDir::new().unwrap();
        write(&dir, "readme.txt", "nothing");
        let err = UsfmFormat.parse(dir.path(), &resolver()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyImport(_)));
    }

    #[test]
    fn test_usfm_unresolved_book_aborts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.usfm", "\\id XYZ\n\\c 1\n\\v 1 a\n");
        let err = UsfmFormat.parse(dir.path(), &resolver()).unwrap_err();
        assert!(matches!(err, ImportError::UnresolvedBook { .. }));
    }

    #[test]
    fn test_html_directory_skips_introductions() {
        let dir = TempDir::new().unwrap();
        let page = r#"<div class="main"><span class="verse" id="V1">1</span>One.</div>"#;
        write(&dir, "GEN00.htm", page);
        write(&dir, "gen01.htm", page);
        write(&dir, "GEN02.htm", page);
        write(&dir, "index.htm", page);

        let output = HtmlFormat.parse(dir.path(), &resolver()).unwrap();
        assert_eq!(output.units, 2);
        assert_eq!(output.verses.len(), 2);
        assert!(output.verses.iter().all(|v| v.book_code == "genesis"));
    }

    #[test]
    fn test_html_no_matching_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index.html", "<html></html>");
        let err = HtmlFormat.parse(dir.path(), &resolver()).unwrap_err();
        assert!(matches!(err, ImportError::NoMatchingFiles { .. }));
    }

    #[test]
    fn test_html_only_introduction_is_empty_import() {
        let dir = TempDir::new().unwrap();
        write(&dir, "GEN00.htm", "<div class=\"main\">Intro</div>");
        let err = HtmlFormat.parse(dir.path(), &resolver()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyImport(_)));
    }

    #[test]
    fn test_html_unresolved_code() {
        let dir = TempDir::new().unwrap();
        write(&dir, "XYZ01.htm", "<div class=\"main\"></div>");
        let err = HtmlFormat.parse(dir.path(), &resolver()).unwrap_err();
        assert!(matches!(err, ImportError::UnresolvedBook { .. }));
    }

    #[test]
    fn test_html_chapter_without_verses_not_counted() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "RUT01.htm",
            r#"<div class="main"><span class="verse" id="V1">1</span>One.</div>"#,
        );
        write(&dir, "RUT02.htm", "<div class=\"main\"><p>No markers.</p></div>");

        let output = HtmlFormat.parse(dir.path(), &resolver()).unwrap();
        assert_eq!(output.units, 1);
        assert_eq!(output.verses.len(), 1);
    }
}
