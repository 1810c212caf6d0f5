/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lookup key of a cached translation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source text to translate
    pub source_text: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// A cached translation, unique per (source text, source language, target language)
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRecord {
    /// Original source text
    pub source_text: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Translated text
    pub translated_text: String,
    /// When the translation was produced
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    /// Create a record timestamped now
    pub fn new(
        source_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        translated_text: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(
            source_text,
            source_language,
            target_language,
            translated_text,
            Utc::now(),
        )
    }

    /// Create a record with an explicit timestamp
    pub fn with_timestamp(
        source_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        translated_text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            translated_text: translated_text.into(),
            created_at,
        }
    }

    /// The key this record is stored under
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.source_text, &self.source_language, &self.target_language)
    }
}

/// A flashcard category with its language pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Database ID
    pub id: i64,
    /// Display name
    pub name: String,
    /// ARGB display colour
    pub color: i64,
    /// Language the cards are written in
    pub foreign_language: String,
    /// Language the cards are translated into
    pub target_language: String,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>, color: i64, foreign_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be assigned by database
            name: name.into(),
            color,
            foreign_language: foreign_language.into(),
            target_language: target_language.into(),
        }
    }
}

/// A single vocabulary card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Database ID
    pub id: i64,
    /// Owning category
    pub category_id: i64,
    /// The word in the foreign language
    pub word: String,
    /// Translation, absent when it could not be fetched
    pub translation: Option<String>,
    /// Marked for the bookmarked quiz
    #[serde(default)]
    pub is_bookmarked: bool,
    /// Wrong quiz answers so far
    #[serde(default)]
    pub incorrect_count: i64,
}

impl Flashcard {
    /// Create a new flashcard
    pub fn new(category_id: i64, word: impl Into<String>, translation: Option<String>) -> Self {
        Self {
            id: 0, // Will be assigned by database
            category_id,
            word: word.into(),
            translation,
            is_bookmarked: false,
            incorrect_count: 0,
        }
    }
}

/// A flashcard with its example sentences and tag names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDetails {
    /// The card itself
    pub flashcard: Flashcard,
    /// Example sentences in insertion order
    pub examples: Vec<String>,
    /// Tag names, alphabetical
    pub tags: Vec<String>,
}
