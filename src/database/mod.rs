/*!
 * Database module for persistent storage of translations and flashcards.
 *
 * This module provides SQLite-based persistence for:
 * - The translation cache (one record per text and language pair)
 * - Categories, flashcards, example sentences and tags
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{CacheKey, Category, Flashcard, FlashcardDetails, TranslationRecord};
pub use repository::{CacheStats, Repository};
