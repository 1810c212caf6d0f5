/*!
 * Integration tests for the cache-aside translation flow over SQLite
 */

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use lexicard::database::{CacheKey, Repository, TranslationRecord};
use lexicard::errors::TranslationError;
use lexicard::language_utils::SourceLanguage;
use lexicard::providers::mock::MockEngine;
use crate::common;

/// The canonical scenario: empty cache, "Katze" de -> en
#[tokio::test]
async fn test_translate_katzeWithEmptyCache_shouldStoreExactlyOneRecord() -> Result<()> {
    common::init_test_logging();
    let repo = common::memory_repository()?;
    let engine = MockEngine::working();
    let service = common::service_with(&engine, repo.clone());

    let before = Utc::now();
    let translated = service.translate("Katze", SourceLanguage::explicit("de"), "en").await?;

    assert_eq!(translated, "cat");
    let stats = repo.get_cache_stats(before - ChronoDuration::days(30)).await?;
    assert_eq!(stats.total_entries, 1);

    let record = repo
        .get_cached_translation(&CacheKey::new("Katze", "de", "en"))
        .await?
        .expect("record should be cached");
    assert_eq!(record.translated_text, "cat");
    // Stored with millisecond precision
    assert!(record.created_at.timestamp_millis() >= before.timestamp_millis());
    Ok(())
}

#[tokio::test]
async fn test_translate_withFreshSqliteRecord_shouldSkipProvider() -> Result<()> {
    let repo = common::memory_repository()?;
    repo.upsert_cached_translation(&TranslationRecord::with_timestamp(
        "Hund",
        "de",
        "en",
        "hound",
        Utc::now() - ChronoDuration::days(29),
    ))
    .await?;
    let engine = MockEngine::working();
    let service = common::service_with(&engine, repo.clone());

    let translated = service.translate("Hund", SourceLanguage::explicit("de"), "en").await?;

    assert_eq!(translated, "hound");
    assert_eq!(engine.prepare_calls(), 0);
    assert_eq!(engine.translate_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translate_withExpiredSqliteRecord_shouldOverwriteIt() -> Result<()> {
    let repo = common::memory_repository()?;
    let old = Utc::now() - ChronoDuration::days(31);
    repo.upsert_cached_translation(&TranslationRecord::with_timestamp("Hund", "de", "en", "hound", old))
        .await?;
    let engine = MockEngine::working();
    let service = common::service_with(&engine, repo.clone());

    let translated = service.translate("Hund", SourceLanguage::explicit("de"), "en").await?;

    assert_eq!(translated, "dog");
    let record = repo.get_cached_translation(&CacheKey::new("Hund", "de", "en")).await?.unwrap();
    assert_eq!(record.translated_text, "dog");
    assert!(record.created_at > old);
    assert_eq!(repo.get_cache_stats(old).await?.total_entries, 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_withAutoDetect_shouldPersistUnderDetectedLanguage() -> Result<()> {
    let repo = common::memory_repository()?;
    let engine = MockEngine::working()
        .with_detected_language(Some("fr"))
        .with_translation("Bonjour", "fr", "en", "hello");
    let service = common::service_with(&engine, repo.clone());

    let translated = service.translate("Bonjour", SourceLanguage::AutoDetect, "en").await?;

    assert_eq!(translated, "hello");
    assert!(repo.get_cached_translation(&CacheKey::new("Bonjour", "fr", "en")).await?.is_some());
    assert!(repo.get_cached_translation(&CacheKey::new("Bonjour", "auto", "en")).await?.is_none());

    // Second request: detected key is fresh, no new model work
    let again = service.translate("Bonjour", SourceLanguage::AutoDetect, "en").await?;
    assert_eq!(again, "hello");
    assert_eq!(engine.translate_calls(), 1);
    assert_eq!(engine.detect_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_translate_withUndeterminedLanguage_shouldFallBackToDefaultSource() -> Result<()> {
    let repo = common::memory_repository()?;
    let engine = MockEngine::working().with_detected_language(Some("und"));
    let service = common::service_with(&engine, repo.clone());

    let translated = service.translate("Danke", SourceLanguage::AutoDetect, "en").await?;

    assert_eq!(translated, "thank you");
    assert!(repo.get_cached_translation(&CacheKey::new("Danke", "de", "en")).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_translate_withSlowEngine_shouldTimeOutAndLeaveCacheEmpty() -> Result<()> {
    let repo = common::memory_repository()?;
    let engine = MockEngine::slow(1_000);
    let service = common::service_with(&engine, repo.clone());

    let result = service
        .translate_with_timeout("Katze", SourceLanguage::explicit("de"), "en", Duration::from_millis(100))
        .await;

    let error = assert_err!(result);
    assert!(matches!(error, TranslationError::Timeout(_)));
    assert!(error.is_retryable());
    assert_eq!(repo.get_cache_stats(Utc::now()).await?.total_entries, 0);
    Ok(())
}

#[tokio::test]
async fn test_translate_concurrentlyForSameWord_shouldConvergeOnOneRecord() -> Result<()> {
    let repo = common::memory_repository()?;
    let engine = MockEngine::working();
    let service = Arc::new(common::service_with(&engine, repo.clone()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.translate("Haus", SourceLanguage::explicit("de"), "en").await
        }));
    }
    for handle in handles {
        assert_eq!(assert_ok!(handle.await?), "house");
    }

    assert_eq!(repo.get_cache_stats(Utc::now()).await?.total_entries, 1);
    assert_eq!(engine.prepare_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_withOnDiskDatabase_shouldSurviveReopen() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cache.db");

    {
        let repo = Arc::new(Repository::open(&path)?);
        let service = common::service_with(&MockEngine::working(), repo);
        service.translate("Katze", SourceLanguage::explicit("de"), "en").await?;
    }

    let repo = Arc::new(Repository::open(&path)?);
    let engine = MockEngine::failing_translation();
    let service = common::service_with(&engine, repo);

    let translated = service.translate("Katze", SourceLanguage::explicit("de"), "en").await?;
    assert_eq!(translated, "cat");
    assert_eq!(engine.translate_calls(), 0);
    Ok(())
}
