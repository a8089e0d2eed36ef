use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates every table and index if missing. Safe to run on every start.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per (language, book, chapter, verse, translation type)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            language_code TEXT NOT NULL,
            book_code TEXT NOT NULL,
            chapter INTEGER NOT NULL,
            verse INTEGER NOT NULL,
            translation_type TEXT NOT NULL,
            english_text TEXT,
            translated_text TEXT,
            human_verified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(language_code, book_code, chapter, verse, translation_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_verses_language ON verses(language_code, translation_type)",
    )
    .execute(pool)
    .await?;

    // Progress counters are flattened per translation level
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS languages (
            language_code TEXT PRIMARY KEY,
            language_name TEXT NOT NULL,
            is_base_language INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'active',
            human_books_started INTEGER NOT NULL DEFAULT 0,
            human_books_completed INTEGER NOT NULL DEFAULT 0,
            human_verses_translated INTEGER NOT NULL DEFAULT 0,
            human_last_updated TEXT,
            ai_books_started INTEGER NOT NULL DEFAULT 0,
            ai_books_completed INTEGER NOT NULL DEFAULT 0,
            ai_verses_translated INTEGER NOT NULL DEFAULT 0,
            ai_last_updated TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
