/*!
 * Translation caching and resolution.
 *
 * This module contains the translation flow used when flashcards are added
 * or edited. It is split into several submodules:
 *
 * - `core`: The cache-aside `TranslationService`
 * - `cache`: Translation store trait, in-memory store and freshness policy
 * - `resolver`: Source language resolution with auto-detection
 * - `adapter`: Prepared provider sessions over a translation engine
 */

// Re-export main types for easier usage
pub use self::adapter::{ProviderAdapter, SessionHandle};
pub use self::cache::{CachePolicy, TranslationCache, TranslationStore};
pub use self::core::TranslationService;
pub use self::resolver::{LanguageResolver, Resolution};

// Submodules
pub mod adapter;
pub mod cache;
pub mod core;
pub mod resolver;
