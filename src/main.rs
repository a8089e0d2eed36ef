//! # Lectio CLI (`lectio`)
//!
//! ## Usage
//!
//! ```bash
//! lectio --config ./config/lectio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lectio init` | Create the SQLite database and run schema migrations |
//! | `lectio import usfm <dir> <lang> [type]` | Import a directory of USFM files |
//! | `lectio import html <dir> <lang> [type]` | Import a directory of per-chapter HTML files |
//! | `lectio read <lang> <book> <chapter>` | Print one chapter next to the base language |
//! | `lectio verify <lang> <book> <chapter> <verse>` | Mark a verse as human-verified |
//! | `lectio languages` | List languages with verification totals |
//! | `lectio books <lang>` | Per-book progress against the canon |
//! | `lectio new-language <name>` | Register a language before importing |
//! | `lectio serve` | Start the HTTP server |

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lectio::import::SourceFormat;
use lectio::progress::ProgressMode;
use lectio::{config, import, languages, logging, migrate, read, server};
use lectio_core::models::TranslationType;

/// Lectio: import, read, and review Bible translations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lectio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lectio",
    about = "Lectio: import, read, and review Bible translations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lectio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import a translation from a directory.
    Import {
        #[command(subcommand)]
        format: ImportFormat,
    },

    /// Print one chapter of a language, paired with the base language.
    Read {
        language: String,
        /// Book code, USFM identifier, or name (`john`, `JHN`, `John`).
        book: String,
        chapter: u32,
        #[arg(long)]
        translation_type: Option<TranslationType>,
    },

    /// Set (or with `--unset`, clear) the human-verified flag on one verse.
    Verify {
        language: String,
        book: String,
        chapter: u32,
        verse: u32,
        #[arg(long)]
        unset: bool,
        #[arg(long)]
        translation_type: Option<TranslationType>,
    },

    /// List languages with total and verified verse counts.
    Languages,

    /// Show per-book progress for one language.
    Books {
        language: String,
        #[arg(long)]
        translation_type: Option<TranslationType>,
    },

    /// Register a language with zeroed progress. Existing languages are left as they are.
    NewLanguage {
        /// Display name; the code is derived from it (`Kope Dialect` becomes `kope_dialect`).
        name: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum ImportFormat {
    /// USFM files (`*.usfm`, `*.SFM`, `*.sfm`, `*.USFM`), one book per file.
    Usfm {
        #[command(flatten)]
        args: ImportArgs,
    },
    /// Per-chapter HTML files named `{CODE}{NN}.htm`.
    Html {
        #[command(flatten)]
        args: ImportArgs,
    },
}

#[derive(clap::Args)]
struct ImportArgs {
    directory: PathBuf,
    language_code: String,
    /// `human` or `ai`; defaults to `[import].default_translation_type`.
    translation_type: Option<TranslationType>,
    /// Display name; defaults to the language code.
    #[arg(long)]
    language_name: Option<String>,
    /// Progress on stderr: off, human, or json. Human when stderr is a TTY.
    #[arg(long)]
    progress: Option<ProgressMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { format } => {
            let (format, args) = match format {
                ImportFormat::Usfm { args } => (SourceFormat::Usfm, args),
                ImportFormat::Html { args } => (SourceFormat::Html, args),
            };
            let progress = args.progress.unwrap_or_else(ProgressMode::default_for_tty);
            import::run_import(
                &cfg,
                format,
                &args.directory,
                &args.language_code,
                args.language_name.as_deref(),
                args.translation_type,
                progress,
            )
            .await?;
        }
        Commands::Read {
            language,
            book,
            chapter,
            translation_type,
        } => {
            read::run_read(&cfg, &language, &book, chapter, translation_type).await?;
        }
        Commands::Verify {
            language,
            book,
            chapter,
            verse,
            unset,
            translation_type,
        } => {
            read::run_verify(&cfg, &language, &book, chapter, verse, translation_type, !unset)
                .await?;
        }
        Commands::Languages => {
            languages::run_languages(&cfg).await?;
        }
        Commands::Books {
            language,
            translation_type,
        } => {
            languages::run_books(&cfg, &language, translation_type).await?;
        }
        Commands::NewLanguage { name } => {
            languages::run_new_language(&cfg, &name).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
