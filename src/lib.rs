//! # Lectio
//!
//! A Bible translation store. Lectio imports whole translations from USFM
//! or per-chapter HTML directories, maps every verse onto the 66-book
//! canonical structure, and keeps one document per verse and translation
//! level in SQLite so reviewers can read chapters side by side with the
//! base language and mark verses as verified.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ USFM / HTML │──▶│ BibleFormat  │──▶│ Reconciler │──▶│  SQLite  │
//! │ directories │   │ parse        │   │ (core)     │   │  verses  │
//! └─────────────┘   └──────────────┘   └────────────┘   └────┬─────┘
//!                                                            │
//!                                        ┌───────────────────┤
//!                                        ▼                   ▼
//!                                   ┌──────────┐       ┌──────────┐
//!                                   │   CLI    │       │   HTTP   │
//!                                   │ (lectio) │       │  (axum)  │
//!                                   └──────────┘       └──────────┘
//! ```
//!
//! Canon, book resolution, content parsers, the store trait and the
//! reconciler live in the `lectio_core` crate; this crate adds the
//! filesystem, SQLite, CLI and HTTP edges.
//!
//! ## Quick Start
//!
//! ```bash
//! lectio init
//! lectio import usfm ./bibles/eng-web english
//! lectio import html ./bibles/spa-html spanish ai --language-name Español
//! lectio read spanish john 1
//! lectio serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Import and lookup error types |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `VerseStore` |
//! | [`formats`] | USFM and HTML directory front-ends |
//! | [`import`] | `import_usfm` / `import_html` entry points |
//! | [`progress`] | Import progress on stderr |
//! | [`read`] | Chapter reader and verification toggle |
//! | [`languages`] | Language summaries and per-book progress |
//! | [`server`] | HTTP API |

pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod import;
pub mod languages;
pub mod logging;
pub mod migrate;
pub mod progress;
pub mod read;
pub mod server;
pub mod sqlite_store;
