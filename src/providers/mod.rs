/*!
 * Translation engine implementations.
 *
 * This module contains the backends the provider adapter can drive:
 * - Ollama: local model server reached over HTTP
 * - Mock: dictionary-backed engine for tests and offline use
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils::LanguagePair;

/// Common trait for all translation engines
///
/// Engines receive language codes already normalized to the supported
/// vocabulary. They may hold per-pair state between `prepare_model` and
/// `release_model`.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Make the model for `pair` ready, downloading it if needed and allowed
    ///
    /// # Arguments
    /// * `pair` - Normalized language pair
    /// * `allow_metered` - Whether a download may use any network class
    async fn prepare_model(&self, pair: &LanguagePair, allow_metered: bool) -> Result<(), ProviderError>;

    /// Release resources held for `pair`
    async fn release_model(&self, _pair: &LanguagePair) {}

    /// Identify the language of `text`
    ///
    /// # Returns
    /// * `Ok(Some(code))` - a language code as reported by the engine
    /// * `Ok(None)` - the engine could not determine the language
    async fn detect_language(&self, text: &str) -> Result<Option<String>, ProviderError>;

    /// Translate `text` with the model prepared for `pair`
    async fn translate(&self, pair: &LanguagePair, text: &str) -> Result<String, ProviderError>;
}

/// Build the engine selected in the configuration
///
/// Returns `None` when translation is disabled.
pub fn engine_from_config(config: &Config) -> Option<Arc<dyn TranslationEngine>> {
    match config.translation.provider {
        TranslationProvider::Ollama => Some(Arc::new(ollama::OllamaEngine::from_config(
            &config.translation.ollama,
        ))),
        TranslationProvider::Mock => Some(Arc::new(mock::MockEngine::working())),
        TranslationProvider::Disabled => None,
    }
}

pub mod mock;
pub mod ollama;
