//! Application-level errors.
//!
//! [`ImportError`] covers the directory-level facts of an import (missing
//! directory, no matching files, nothing to import) on top of the core
//! parse and reconcile errors. [`LookupError`] covers the read and review
//! paths. Both are mapped to HTTP status codes in [`crate::server`].

use std::path::PathBuf;

use thiserror::Error;

use lectio_core::error::{CanonError, ReconcileError, UnresolvedBookError};
use lectio_core::models::ImportResult;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no files matching {pattern} in {}", .dir.display())]
    NoMatchingFiles { dir: PathBuf, pattern: String },

    #[error("no verses found to import in {}", .0.display())]
    EmptyImport(PathBuf),

    #[error("{}: no \\id marker found", .file.display())]
    MissingBookId { file: PathBuf },

    #[error("{}: {source}", .file.display())]
    UnresolvedBook {
        file: PathBuf,
        #[source]
        source: UnresolvedBookError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("parser task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl ImportError {
    /// True for problems with the caller's input, reported before any write.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            ImportError::Reconcile(_) | ImportError::Task(_) | ImportError::Pattern { .. }
        )
    }

    /// Counts accumulated before a storage failure.
    pub fn partial(&self) -> Option<&ImportResult> {
        match self {
            ImportError::Reconcile(e) => Some(e.partial()),
            _ => None,
        }
    }
}

/// Failures of the chapter reader, verification, and language lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    UnknownBook(#[from] UnresolvedBookError),

    #[error(transparent)]
    OutOfRange(#[from] CanonError),

    #[error("{0}")]
    NotFound(String),

    #[error("invalid language name '{0}': use letters, digits, spaces, hyphens, or underscores")]
    InvalidLanguage(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
