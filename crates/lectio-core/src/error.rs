//! Typed errors raised by the core pipeline.
//!
//! Input-shaped failures (unknown book, unresolvable identifier, missing
//! `\id`) are distinct from storage failures so callers can decide whether
//! to skip a record, abort a file, or surface a partial result.

use thiserror::Error;

use crate::models::ImportResult;

/// A reference that does not fit the canonical structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonError {
    #[error("unknown book code '{0}'")]
    UnknownBook(String),

    #[error("{book} chapter {chapter} is out of range ({book} has {chapters} chapters)")]
    ChapterOutOfRange {
        book: String,
        chapter: u32,
        chapters: u32,
    },

    #[error("{book} {chapter}:{verse} is out of range (chapter has {verses} verses)")]
    VerseOutOfRange {
        book: String,
        chapter: u32,
        verse: u32,
        verses: u32,
    },
}

/// A book identifier that matches no canonical book.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not resolve book identifier '{0}'")]
pub struct UnresolvedBookError(pub String);

/// Per-file USFM input errors. Both abort the file before any record is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsfmError {
    #[error("no \\id marker found")]
    MissingBookId,

    #[error(transparent)]
    UnresolvedBook(#[from] UnresolvedBookError),
}

/// Fatal reconciliation failure.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The store failed mid-batch. Verses written before the failure remain;
    /// re-running the import is safe.
    #[error("storage failure after {} verses: {cause}", .partial.total_processed())]
    Storage {
        partial: Box<ImportResult>,
        cause: anyhow::Error,
    },
}

impl ReconcileError {
    /// Counts accumulated before the failure.
    pub fn partial(&self) -> &ImportResult {
        match self {
            ReconcileError::Storage { partial, .. } => partial,
        }
    }
}
