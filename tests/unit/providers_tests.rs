/*!
 * Tests for the translation engine implementations
 */

use std::sync::Arc;
use lexicard::app_config::{Config, OllamaConfig, TranslationProvider};
use lexicard::errors::ProviderError;
use lexicard::language_utils::LanguagePair;
use lexicard::providers::mock::MockEngine;
use lexicard::providers::ollama::{Ollama, OllamaEngine};
use lexicard::providers::{engine_from_config, TranslationEngine};

/// Test engine selection from configuration
#[test]
fn test_engineFromConfig_withEachProvider_shouldSelectEngine() {
    let mut config = Config::default();

    config.translation.provider = TranslationProvider::Mock;
    assert_eq!(engine_from_config(&config).map(|e| e.name().to_string()).as_deref(), Some("mock"));

    config.translation.provider = TranslationProvider::Ollama;
    assert_eq!(engine_from_config(&config).map(|e| e.name().to_string()).as_deref(), Some("ollama"));

    config.translation.provider = TranslationProvider::Disabled;
    assert!(engine_from_config(&config).is_none());
}

#[tokio::test]
async fn test_mockEngine_withCustomEntry_shouldTranslateCaseInsensitively() {
    let engine = MockEngine::working().with_translation("Baum", "de", "en", "tree");
    let pair = LanguagePair::new("de", "en");

    engine.prepare_model(&pair, false).await.unwrap();

    assert_eq!(engine.translate(&pair, "BAUM").await.unwrap(), "tree");
    assert_eq!(engine.prepare_calls(), 1);
}

#[tokio::test]
async fn test_mockEngine_failingPreparation_shouldNeverBecomeReady() {
    let engine = MockEngine::failing_preparation();
    let pair = LanguagePair::new("de", "en");

    let result = engine.prepare_model(&pair, true).await;

    assert!(matches!(result, Err(ProviderError::ModelNotFound(_))));
    assert!(engine.prepared_pairs().is_empty());
}

#[tokio::test]
async fn test_mockEngine_release_shouldForgetPair() {
    let engine: Arc<dyn TranslationEngine> = Arc::new(MockEngine::working());
    let pair = LanguagePair::new("de", "en");

    engine.prepare_model(&pair, true).await.unwrap();
    engine.release_model(&pair).await;

    assert!(engine.translate(&pair, "Hund").await.is_err());
}

#[test]
fn test_ollama_new_withBareHost_shouldNormalizeBaseUrl() {
    let client = Ollama::new("127.0.0.1:11434/", std::time::Duration::from_secs(5), 0, 10);
    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:11434/");
}

/// Test the Ollama engine against a live server
#[tokio::test]
#[ignore]
async fn test_ollama_engine_withRunningServer_shouldTranslate() {
    // Only runs when an Ollama endpoint is provided
    let endpoint = std::env::var("OLLAMA_ENDPOINT").unwrap_or_default();
    if endpoint.is_empty() {
        return;
    }

    let config = OllamaConfig {
        endpoint,
        allow_model_pull: false,
        ..OllamaConfig::default()
    };
    let engine = OllamaEngine::from_config(&config);
    let pair = LanguagePair::new("de", "en");

    engine.prepare_model(&pair, false).await.unwrap();
    let translated = engine.translate(&pair, "Katze").await.unwrap();
    assert!(!translated.is_empty());

    println!("Ollama translation: {}", translated);
    engine.release_model(&pair).await;
}
