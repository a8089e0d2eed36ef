//! SQLite-backed [`VerseStore`] implementation.
//!
//! Verses live in one table with a `UNIQUE` composite key; languages keep
//! their per-level progress counters in flattened `human_*` / `ai_*`
//! columns. Timestamps are stored as RFC 3339 text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use lectio_core::models::{
    LanguageDocument, LanguageSummary, LanguageUpdate, LevelProgress, TranslationLevels,
    TranslationType, UpsertOutcome, VerseDocument, VerseKey, VerseWrite,
};
use lectio_core::store::VerseStore;

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`VerseStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the configured database and makes sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid stored timestamp: {}", raw))?
        .with_timezone(&Utc))
}

fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}

fn level_prefix(translation_type: TranslationType) -> &'static str {
    match translation_type {
        TranslationType::Human => "human",
        TranslationType::Ai => "ai",
    }
}

fn verse_from_row(row: &SqliteRow) -> Result<VerseDocument> {
    let translation_type: String = row.try_get("translation_type")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(VerseDocument {
        language_code: row.try_get("language_code")?,
        book_code: row.try_get("book_code")?,
        chapter: row.try_get::<i64, _>("chapter")? as u32,
        verse: row.try_get::<i64, _>("verse")? as u32,
        translation_type: translation_type.parse()?,
        english_text: row.try_get("english_text")?,
        translated_text: row.try_get("translated_text")?,
        human_verified: row.try_get("human_verified")?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn level_from_row(row: &SqliteRow, prefix: &str) -> Result<LevelProgress> {
    Ok(LevelProgress {
        books_started: row.try_get::<i64, _>(format!("{}_books_started", prefix).as_str())? as u32,
        books_completed: row.try_get::<i64, _>(format!("{}_books_completed", prefix).as_str())?
            as u32,
        verses_translated: row
            .try_get::<i64, _>(format!("{}_verses_translated", prefix).as_str())?
            as u64,
        last_updated: parse_opt_ts(row.try_get(format!("{}_last_updated", prefix).as_str())?)?,
    })
}

fn language_from_row(row: &SqliteRow) -> Result<LanguageDocument> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(LanguageDocument {
        language_code: row.try_get("language_code")?,
        language_name: row.try_get("language_name")?,
        is_base_language: row.try_get("is_base_language")?,
        status: row.try_get("status")?,
        translation_levels: TranslationLevels {
            human: level_from_row(row, "human")?,
            ai: level_from_row(row, "ai")?,
        },
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[async_trait]
impl VerseStore for SqliteStore {
    async fn upsert_verse(&self, w: &VerseWrite) -> Result<UpsertOutcome> {
        let at = format_ts(w.at);
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO verses (language_code, book_code, chapter, verse, translation_type,
                                english_text, translated_text, human_verified,
                                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(language_code, book_code, chapter, verse, translation_type) DO NOTHING
            "#,
        )
        .bind(&w.key.language_code)
        .bind(&w.key.book_code)
        .bind(w.key.chapter as i64)
        .bind(w.key.verse as i64)
        .bind(w.key.translation_type.as_str())
        .bind(w.english_text())
        .bind(w.translated_text())
        .bind(&at)
        .bind(&at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(
                r#"
                UPDATE verses SET
                    english_text = COALESCE(?, english_text),
                    translated_text = COALESCE(?, translated_text),
                    updated_at = ?
                WHERE language_code = ? AND book_code = ? AND chapter = ? AND verse = ?
                  AND translation_type = ?
                "#,
            )
            .bind(w.english_text())
            .bind(w.translated_text())
            .bind(&at)
            .bind(&w.key.language_code)
            .bind(&w.key.book_code)
            .bind(w.key.chapter as i64)
            .bind(w.key.verse as i64)
            .bind(w.key.translation_type.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn get_language(&self, language_code: &str) -> Result<Option<LanguageDocument>> {
        let row = sqlx::query("SELECT * FROM languages WHERE language_code = ?")
            .bind(language_code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(language_from_row).transpose()
    }

    async fn upsert_language(&self, update: &LanguageUpdate) -> Result<LanguageDocument> {
        let at = format_ts(update.at);
        let prefix = level_prefix(update.translation_type);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO languages (language_code, language_name, is_base_language, status,
                                   created_at, updated_at)
            VALUES (?, ?, ?, 'active', ?, ?)
            ON CONFLICT(language_code) DO NOTHING
            "#,
        )
        .bind(&update.language_code)
        .bind(&update.language_name)
        .bind(update.is_base_language)
        .bind(&at)
        .bind(&at)
        .execute(&mut *tx)
        .await?;

        // Column names come from a closed set, never from input.
        let sql = format!(
            "UPDATE languages SET {p}_books_started = ?, {p}_books_completed = ?, \
             {p}_verses_translated = ?, {p}_last_updated = ?, updated_at = ? \
             WHERE language_code = ?",
            p = prefix
        );
        sqlx::query(&sql)
            .bind(update.progress.books_started as i64)
            .bind(update.progress.books_completed as i64)
            .bind(update.progress.verses_translated as i64)
            .bind(update.progress.last_updated.map(format_ts))
            .bind(&at)
            .bind(&update.language_code)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT * FROM languages WHERE language_code = ?")
            .bind(&update.language_code)
            .fetch_one(&mut *tx)
            .await?;
        let doc = language_from_row(&row)?;

        tx.commit().await?;
        Ok(doc)
    }

    async fn book_verse_counts(
        &self,
        language_code: &str,
        translation_type: TranslationType,
    ) -> Result<Vec<(String, u64)>> {
        let rows = sqlx::query(
            r#"
            SELECT book_code, COUNT(*) AS n FROM verses
            WHERE language_code = ? AND translation_type = ?
            GROUP BY book_code
            "#,
        )
        .bind(language_code)
        .bind(translation_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(String, u64)> {
                Ok((row.try_get("book_code")?, row.try_get::<i64, _>("n")? as u64))
            })
            .collect()
    }

    async fn chapter_verses(
        &self,
        language_code: &str,
        book_code: &str,
        chapter: u32,
        translation_type: TranslationType,
    ) -> Result<Vec<VerseDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM verses
            WHERE language_code = ? AND book_code = ? AND chapter = ? AND translation_type = ?
            ORDER BY verse ASC
            "#,
        )
        .bind(language_code)
        .bind(book_code)
        .bind(chapter as i64)
        .bind(translation_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(verse_from_row).collect()
    }

    async fn set_verified(&self, key: &VerseKey, verified: bool, at: DateTime<Utc>) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE verses SET human_verified = ?, updated_at = ?
            WHERE language_code = ? AND book_code = ? AND chapter = ? AND verse = ?
              AND translation_type = ?
            "#,
        )
        .bind(verified)
        .bind(format_ts(at))
        .bind(&key.language_code)
        .bind(&key.book_code)
        .bind(key.chapter as i64)
        .bind(key.verse as i64)
        .bind(key.translation_type.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn language_summaries(&self) -> Result<Vec<LanguageSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT l.language_code, l.language_name, l.is_base_language,
                   COUNT(v.id) AS total,
                   COALESCE(SUM(v.human_verified), 0) AS verified
            FROM languages l
            LEFT JOIN verses v ON v.language_code = l.language_code
            GROUP BY l.language_code
            ORDER BY l.language_code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<LanguageSummary> {
                let total = row.try_get::<i64, _>("total")? as u64;
                let verified = row.try_get::<i64, _>("verified")? as u64;
                Ok(LanguageSummary {
                    language_code: row.try_get("language_code")?,
                    language_name: row.try_get("language_name")?,
                    is_base_language: row.try_get("is_base_language")?,
                    total_verses: total,
                    verified_count: verified,
                    verification_progress: LanguageSummary::verification_percent(verified, total),
                })
            })
            .collect()
    }
}
