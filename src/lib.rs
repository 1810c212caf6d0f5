/*!
 * # Lexicard - vocabulary flashcards with cached translations
 *
 * A Rust library for building vocabulary flashcards whose translations are
 * fetched automatically from a local translation engine.
 *
 * ## Features
 *
 * - Categories per language pair, flashcards with example sentences and tags
 * - Multiple-choice quizzes with bookmarks and recall of missed cards
 * - Cache-aside translation with a time-to-live (30 days by default)
 * - Source language auto-detection with fallback to a default language
 * - Prepared translation sessions with on-demand model download
 * - One time budget per translation request and typed errors
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite persistence for cards and the translation cache
 * - `translation`: Translation caching and resolution:
 *   - `translation::core`: Cache-aside translation service
 *   - `translation::cache`: Store trait, in-memory store and freshness policy
 *   - `translation::resolver`: Source language resolution
 *   - `translation::adapter`: Prepared provider sessions
 * - `providers`: Translation engines:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Dictionary-backed engine for tests and offline use
 * - `quiz`: Multiple-choice quizzes over a category
 * - `app_controller`: Flashcard flows used by the CLI
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod quiz;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, FlashcardOutcome};
pub use translation::TranslationService;
pub use language_utils::{get_language_name, SourceLanguage};
pub use errors::{AppError, ProviderError, TranslationError};
