/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;

use super::connection::DatabaseConnection;
use super::models::{CacheKey, Category, Flashcard, FlashcardDetails, TranslationRecord};
use crate::translation::cache::TranslationStore;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository backed by the given file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = DatabaseConnection::new(path)?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Translation Cache Operations
    // =========================================================================

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get a cached translation, fresh or stale
    pub async fn get_cached_translation(&self, key: &CacheKey) -> Result<Option<TranslationRecord>> {
        let key = key.clone();
        let source_text_hash = Self::hash_text(&key.source_text);

        self.db
            .execute_async(move |conn| {
                let row: Option<(String, i64)> = conn
                    .query_row(
                        r#"
                        SELECT translated_text, created_at
                        FROM translations
                        WHERE source_text_hash = ?1
                          AND source_text = ?2
                          AND source_language = ?3
                          AND target_language = ?4
                        "#,
                        params![
                            source_text_hash,
                            key.source_text,
                            key.source_language,
                            key.target_language
                        ],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                row.map(|(translated_text, created_at)| {
                    Ok(TranslationRecord {
                        source_text: key.source_text,
                        source_language: key.source_language,
                        target_language: key.target_language,
                        translated_text,
                        created_at: millis_to_datetime(created_at)?,
                    })
                })
                .transpose()
            })
            .await
    }

    /// Insert or replace the cached translation for the record's key
    pub async fn upsert_cached_translation(&self, record: &TranslationRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translations (
                        source_text_hash, source_text, source_language, target_language,
                        translated_text, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(source_text_hash, source_language, target_language)
                    DO UPDATE SET
                        source_text = excluded.source_text,
                        translated_text = excluded.translated_text,
                        created_at = excluded.created_at
                    "#,
                    params![
                        Self::hash_text(&record.source_text),
                        record.source_text,
                        record.source_language,
                        record.target_language,
                        record.translated_text,
                        record.created_at.timestamp_millis(),
                    ],
                )?;
                debug!(
                    "Cached translation ({} -> {})",
                    record.source_language, record.target_language
                );
                Ok(())
            })
            .await
    }

    /// Get cache statistics; entries created before `stale_before` count as stale
    pub async fn get_cache_stats(&self, stale_before: DateTime<Utc>) -> Result<CacheStats> {
        let cutoff = stale_before.timestamp_millis();

        self.db
            .execute_async(move |conn| {
                let total_entries: i64 = conn
                    .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
                    .unwrap_or(0);

                let stale_entries: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM translations WHERE created_at <= ?1",
                        [cutoff],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                Ok(CacheStats {
                    total_entries,
                    stale_entries,
                })
            })
            .await
    }

    /// Clear the translation cache
    pub async fn clear_cache(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM translations", [])?;
                Ok(deleted as i64)
            })
            .await
    }

    /// Delete entries created at or before `stale_before`
    pub async fn purge_stale(&self, stale_before: DateTime<Utc>) -> Result<i64> {
        let cutoff = stale_before.timestamp_millis();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translations WHERE created_at <= ?1", [cutoff])?;
                Ok(deleted as i64)
            })
            .await
    }

    // =========================================================================
    // Category Operations
    // =========================================================================

    /// Insert a category and return its id
    pub async fn create_category(&self, category: &Category) -> Result<i64> {
        let category = category.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO categories (name, color, foreign_language, target_language) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        category.name,
                        category.color,
                        category.foreign_language,
                        category.target_language
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Get a category by id
    pub async fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        self.db
            .execute_async(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, name, color, foreign_language, target_language FROM categories WHERE id = ?1",
                        [category_id],
                        category_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// All categories in creation order
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, color, foreign_language, target_language FROM categories ORDER BY id",
                )?;
                let categories = stmt
                    .query_map([], category_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(categories)
            })
            .await
    }

    /// Delete a category together with its flashcards; returns whether it existed
    pub async fn delete_category(&self, category_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", [category_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    // =========================================================================
    // Flashcard Operations
    // =========================================================================

    /// Insert a flashcard with its example sentences and tags in one transaction
    pub async fn insert_flashcard_with_details(
        &self,
        flashcard: &Flashcard,
        examples: Vec<String>,
        tags: Vec<String>,
    ) -> Result<i64> {
        let flashcard = flashcard.clone();

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    "INSERT INTO flashcards (category_id, word, translation) VALUES (?1, ?2, ?3)",
                    params![flashcard.category_id, flashcard.word, flashcard.translation],
                )?;
                let flashcard_id = tx.last_insert_rowid();

                replace_details(tx, flashcard_id, &examples, &tags)?;
                Ok(flashcard_id)
            })
            .await
    }

    /// Update a flashcard and replace its example sentences and tags in one transaction
    pub async fn update_flashcard_with_details(
        &self,
        flashcard: &Flashcard,
        examples: Vec<String>,
        tags: Vec<String>,
    ) -> Result<()> {
        let flashcard = flashcard.clone();

        self.db
            .transaction_async(move |tx| {
                let updated = tx.execute(
                    "UPDATE flashcards SET category_id = ?1, word = ?2, translation = ?3 WHERE id = ?4",
                    params![
                        flashcard.category_id,
                        flashcard.word,
                        flashcard.translation,
                        flashcard.id
                    ],
                )?;
                if updated == 0 {
                    return Err(anyhow!("Flashcard {} does not exist", flashcard.id));
                }

                replace_details(tx, flashcard.id, &examples, &tags)
            })
            .await
    }

    /// Flashcards of a category in creation order
    pub async fn list_flashcards(&self, category_id: i64) -> Result<Vec<Flashcard>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM flashcards WHERE category_id = ?1 ORDER BY id",
                    FLASHCARD_COLUMNS
                ))?;
                let flashcards = stmt
                    .query_map([category_id], flashcard_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(flashcards)
            })
            .await
    }

    /// Delete a flashcard with its sentences and tag links; returns whether it existed
    pub async fn delete_flashcard(&self, flashcard_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM flashcards WHERE id = ?1", [flashcard_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Set or clear the bookmark of a flashcard; returns whether it exists
    pub async fn set_bookmarked(&self, flashcard_id: i64, bookmarked: bool) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE flashcards SET is_bookmarked = ?1 WHERE id = ?2",
                    params![bookmarked, flashcard_id],
                )?;
                Ok(updated > 0)
            })
            .await
    }

    /// Count a wrong quiz answer against a flashcard; returns whether it exists
    pub async fn record_incorrect_answer(&self, flashcard_id: i64) -> Result<bool> {
        self.db
            .execute_async(move |conn| {
                let updated = conn.execute(
                    "UPDATE flashcards SET incorrect_count = incorrect_count + 1 WHERE id = ?1",
                    [flashcard_id],
                )?;
                Ok(updated > 0)
            })
            .await
    }

    /// Get a flashcard with its example sentences and tag names
    pub async fn get_flashcard_details(&self, flashcard_id: i64) -> Result<Option<FlashcardDetails>> {
        self.db
            .execute_async(move |conn| {
                let flashcard = conn
                    .query_row(
                        &format!("SELECT {} FROM flashcards WHERE id = ?1", FLASHCARD_COLUMNS),
                        [flashcard_id],
                        flashcard_from_row,
                    )
                    .optional()?;

                let Some(flashcard) = flashcard else {
                    return Ok(None);
                };

                let examples = collect_strings(
                    conn,
                    "SELECT text FROM example_sentences WHERE flashcard_id = ?1 ORDER BY id",
                    flashcard_id,
                )?;
                let tags = collect_strings(
                    conn,
                    r#"
                    SELECT t.name FROM tags t
                    INNER JOIN flashcard_tags c ON t.id = c.tag_id
                    WHERE c.flashcard_id = ?1
                    ORDER BY t.name
                    "#,
                    flashcard_id,
                )?;

                Ok(Some(FlashcardDetails {
                    flashcard,
                    examples,
                    tags,
                }))
            })
            .await
    }
}

#[async_trait]
impl TranslationStore for Repository {
    async fn get(&self, key: &CacheKey) -> Result<Option<TranslationRecord>> {
        self.get_cached_translation(key).await
    }

    async fn put(&self, record: &TranslationRecord) -> Result<()> {
        self.upsert_cached_translation(record).await
    }
}

const FLASHCARD_COLUMNS: &str = "id, category_id, word, translation, is_bookmarked, incorrect_count";

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        foreign_language: row.get(3)?,
        target_language: row.get(4)?,
    })
}

fn flashcard_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        category_id: row.get(1)?,
        word: row.get(2)?,
        translation: row.get(3)?,
        is_bookmarked: row.get(4)?,
        incorrect_count: row.get(5)?,
    })
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow!("Invalid timestamp in translation cache: {}", millis))
}

fn collect_strings(conn: &Connection, sql: &str, id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(values)
}

/// Replace the example sentences and tag links of a flashcard
fn replace_details(conn: &Connection, flashcard_id: i64, examples: &[String], tags: &[String]) -> Result<()> {
    conn.execute("DELETE FROM example_sentences WHERE flashcard_id = ?1", [flashcard_id])?;
    for text in examples {
        conn.execute(
            "INSERT INTO example_sentences (flashcard_id, text) VALUES (?1, ?2)",
            params![flashcard_id, text],
        )?;
    }

    conn.execute("DELETE FROM flashcard_tags WHERE flashcard_id = ?1", [flashcard_id])?;
    for name in tags {
        let tag_id = get_or_create_tag(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO flashcard_tags (flashcard_id, tag_id) VALUES (?1, ?2)",
            params![flashcard_id, tag_id],
        )?;
    }

    Ok(())
}

/// Look up a tag by name, creating it if needed
fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])?;
    let id = conn.query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))?;
    Ok(id)
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Total number of cache entries
    pub total_entries: i64,
    /// Entries past their time-to-live
    pub stale_entries: i64,
}
