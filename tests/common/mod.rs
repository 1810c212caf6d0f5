/*!
 * Common test utilities for the lexicard test suite
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use lexicard::app_config::{Config, TranslationProvider};
use lexicard::database::Repository;
use lexicard::language_utils::UnknownLanguagePolicy;
use lexicard::providers::mock::MockEngine;
use lexicard::translation::{ProviderAdapter, TranslationService, TranslationStore};

/// Route library logs through env_logger; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Configuration using the mock engine and a database inside `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Mock;
    config.database.path = Some(dir.join("lexicard.db"));
    config
}

/// Translation service over `store`, driving a clone of `engine`
pub fn service_with(engine: &MockEngine, store: Arc<dyn TranslationStore>) -> TranslationService {
    let adapter = ProviderAdapter::new(Arc::new(engine.clone()), UnknownLanguagePolicy::Reject, 4);
    TranslationService::new(store, Some(Arc::new(adapter)), "de")
}

/// In-memory repository shared between a service and assertions
pub fn memory_repository() -> Result<Arc<Repository>> {
    Ok(Arc::new(Repository::new_in_memory()?))
}
