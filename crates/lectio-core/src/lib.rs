//! # Lectio Core
//!
//! The Bible text import pipeline, independent of any runtime: the canonical
//! 66-book structure, book-code resolution, USFM and HTML content parsers,
//! data models, the storage trait, and the import reconciler.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Parsers take
//! strings and return records; directory handling and persistence live in
//! the `lectio` application crate.

pub mod books;
pub mod canon;
pub mod error;
pub mod html;
pub mod models;
pub mod reconcile;
pub mod store;
pub mod text;
pub mod usfm;
