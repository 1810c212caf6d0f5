/*!
 * Tests for translation cache functionality
 */

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use lexicard::database::{CacheKey, Repository, TranslationRecord};
use lexicard::translation::{CachePolicy, TranslationCache, TranslationStore};

fn days_ago(days: i64) -> chrono::DateTime<Utc> {
    Utc::now() - ChronoDuration::days(days)
}

#[tokio::test]
async fn test_cache_lookup_withMissingKey_shouldCountMiss() {
    let cache = TranslationCache::new();

    assert!(cache.lookup(&CacheKey::new("Katze", "de", "en")).is_none());

    let (hits, misses, hit_rate) = cache.stats();
    assert_eq!((hits, misses), (0, 1));
    assert_eq!(hit_rate, 0.0);
}

#[tokio::test]
async fn test_cache_store_withSameKey_shouldReplaceRecord() {
    let cache = TranslationCache::new();
    cache.store(TranslationRecord::with_timestamp("Katze", "de", "en", "kitty", days_ago(40)));
    cache.store(TranslationRecord::new("Katze", "de", "en", "cat"));

    assert_eq!(cache.len(), 1);
    let record = cache.lookup(&CacheKey::new("Katze", "de", "en")).unwrap();
    assert_eq!(record.translated_text, "cat");
    assert_eq!(cache.stats().0, 1);
}

#[tokio::test]
async fn test_cache_clear_shouldResetEntriesAndCounters() {
    let cache = TranslationCache::new();
    cache.store(TranslationRecord::new("Hund", "de", "en", "dog"));
    cache.lookup(&CacheKey::new("Hund", "de", "en"));

    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 0, 0.0));
}

#[tokio::test]
async fn test_cache_clone_shouldShareEntries() {
    let cache = TranslationCache::new();
    let store: Arc<dyn TranslationStore> = Arc::new(cache.clone());

    assert_ok!(store.put(&TranslationRecord::new("Haus", "de", "en", "house")).await);

    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cachePolicy_withCustomTtl_shouldJudgeFreshness() {
    let policy = CachePolicy::new(Duration::from_secs(7 * 24 * 60 * 60));
    let now = Utc::now();

    let fresh = TranslationRecord::with_timestamp("Haus", "de", "en", "house", now - ChronoDuration::days(6));
    let stale = TranslationRecord::with_timestamp("Haus", "de", "en", "house", now - ChronoDuration::days(8));

    assert!(policy.is_fresh(&fresh, now));
    assert!(!policy.is_fresh(&stale, now));
    assert_eq!(CachePolicy::default().ttl(), Duration::from_secs(30 * 24 * 60 * 60));
}

#[tokio::test]
async fn test_repository_asStore_shouldReturnStaleRecordsToo() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    let store: &dyn TranslationStore = &repo;
    let created = days_ago(45);

    store.put(&TranslationRecord::with_timestamp("Katze", "de", "en", "cat", created)).await?;

    let record = store.get(&CacheKey::new("Katze", "de", "en")).await?.expect("record should exist");
    assert_eq!(record.translated_text, "cat");
    assert_eq!(record.created_at.timestamp_millis(), created.timestamp_millis());
    assert!(!CachePolicy::default().is_fresh(&record, Utc::now()));
    Ok(())
}

#[tokio::test]
async fn test_repository_keys_shouldDistinguishAutoFromExplicitSource() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    repo.upsert_cached_translation(&TranslationRecord::new("Katze", "de", "en", "cat")).await?;

    assert!(repo.get_cached_translation(&CacheKey::new("Katze", "auto", "en")).await?.is_none());
    assert!(repo.get_cached_translation(&CacheKey::new("katze", "de", "en")).await?.is_none());
    assert!(repo.get_cached_translation(&CacheKey::new("Katze", "de", "en")).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_repository_cacheStats_shouldCountStaleEntries() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    let policy = CachePolicy::default();
    repo.upsert_cached_translation(&TranslationRecord::new("Hund", "de", "en", "dog")).await?;
    repo.upsert_cached_translation(&TranslationRecord::with_timestamp("Haus", "de", "en", "house", days_ago(31))).await?;
    repo.upsert_cached_translation(&TranslationRecord::with_timestamp("Baum", "de", "en", "tree", days_ago(90))).await?;

    let stats = repo.get_cache_stats(policy.stale_before(Utc::now())).await?;
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.stale_entries, 2);

    assert_eq!(repo.clear_cache().await?, 3);
    let stats = repo.get_cache_stats(policy.stale_before(Utc::now())).await?;
    assert_eq!(stats.total_entries, 0);
    Ok(())
}
