/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::time::Duration;
use lexicard::app_config::{Config, LogLevel, TranslationProvider};
use lexicard::language_utils::UnknownLanguagePolicy;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.default_source_language, "de");
    assert_eq!(config.default_target_language, "en");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.cache_ttl(), Duration::from_secs(30 * 24 * 60 * 60));
    assert_eq!(config.translation.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.translation.unknown_language_policy, UnknownLanguagePolicy::Reject);
    assert_eq!(config.translation.max_prepared_sessions, 4);
    assert!(config.translation.allow_metered_download);
    assert_eq!(config.translation.ollama.endpoint, "http://localhost:11434");
    assert!(config.database.path.is_none());
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // "auto" cannot be the fallback for auto-detection
    config.default_source_language = "auto".to_string();
    assert!(config.validate().is_err());
    config.default_source_language = "fr".to_string();
    assert!(config.validate().is_ok());

    config.default_target_language = "".to_string();
    assert!(config.validate().is_err());
    config.default_target_language = "en".to_string();

    config.translation.request_timeout_secs = 0;
    assert!(config.validate().is_err());
    config.translation.request_timeout_secs = 10;

    config.translation.cache_ttl_days = 0;
    assert!(config.validate().is_err());
    config.translation.cache_ttl_days = u64::MAX;
    assert!(config.validate().is_err());
    // Out of range values are rejected above but must not overflow either
    assert!(config.translation.cache_ttl() > std::time::Duration::ZERO);
    config.translation.cache_ttl_days = 30;

    config.translation.max_prepared_sessions = 0;
    assert!(config.validate().is_err());
    config.translation.max_prepared_sessions = 1;

    config.translation.ollama.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    // The endpoint only matters for the Ollama engine
    config.translation.provider = TranslationProvider::Mock;
    assert!(config.validate().is_ok());
}

/// Test that partial JSON files fall back to defaults
#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "default_source_language": "fr",
        "translation": {
            "provider": "mock",
            "unknown_language_policy": "fallback_to_english"
        },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.default_source_language, "fr");
    assert_eq!(config.default_target_language, "en");
    assert_eq!(config.translation.provider, TranslationProvider::Mock);
    assert_eq!(
        config.translation.unknown_language_policy,
        UnknownLanguagePolicy::FallbackToEnglish
    );
    assert_eq!(config.translation.request_timeout_secs, 10);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let mut edited = created.clone();
    edited.default_target_language = "es".to_string();
    edited.save(&path)?;

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.default_target_language, "es");
    Ok(())
}

/// Test provider parsing from strings
#[test]
fn test_translationProvider_fromStr_shouldAcceptKnownNames() {
    assert_eq!("Ollama".parse::<TranslationProvider>().unwrap(), TranslationProvider::Ollama);
    assert_eq!("mock".parse::<TranslationProvider>().unwrap(), TranslationProvider::Mock);
    assert_eq!("none".parse::<TranslationProvider>().unwrap(), TranslationProvider::Disabled);
    assert!("openai".parse::<TranslationProvider>().is_err());
    assert_eq!(TranslationProvider::Disabled.to_string(), "disabled");
}
