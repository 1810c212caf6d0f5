/*!
 * Translation cache storage and freshness policy.
 *
 * `TranslationStore` is the persistence seam used by the translation service.
 * The SQLite `Repository` implements it for the application; `TranslationCache`
 * is an in-memory implementation for tests and database-less runs.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::database::models::{CacheKey, TranslationRecord};

/// Default time-to-live of a cached translation
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Storage of cached translations, keyed by (text, source language, target language)
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Get the record for a key, fresh or stale
    async fn get(&self, key: &CacheKey) -> Result<Option<TranslationRecord>>;

    /// Insert or replace the record for its key
    async fn put(&self, record: &TranslationRecord) -> Result<()>;
}

/// Decides whether a cached record may be served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    ttl: Duration,
}

impl CachePolicy {
    /// Create a policy with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether `record` is younger than the TTL at `now`
    pub fn is_fresh(&self, record: &TranslationRecord, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(record.created_at);
        match age.to_std() {
            Ok(age) => age < self.ttl,
            // Timestamps in the future come from clock skew; treat them as fresh
            Err(_) => true,
        }
    }

    /// Records created at or before this instant are stale at `now`
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// In-memory translation store
#[derive(Clone, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, TranslationRecord>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record from the cache
    pub fn lookup(&self, key: &CacheKey) -> Option<TranslationRecord> {
        let record = self.cache.read().get(key).cloned();

        match &record {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cache hit for '{}' ({} -> {})",
                    truncate_text(&key.source_text, 30),
                    key.source_language,
                    key.target_language
                );
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cache miss for '{}' ({} -> {})",
                    truncate_text(&key.source_text, 30),
                    key.source_language,
                    key.target_language
                );
            }
        }

        record
    }

    /// Insert or replace a record
    pub fn store(&self, record: TranslationRecord) {
        debug!(
            "Cached translation for '{}' ({} -> {})",
            truncate_text(&record.source_text, 30),
            record.source_language,
            record.target_language
        );
        self.cache.write().insert(record.key(), record);
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[async_trait]
impl TranslationStore for TranslationCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<TranslationRecord>> {
        Ok(self.lookup(key))
    }

    async fn put(&self, record: &TranslationRecord) -> Result<()> {
        self.store(record.clone());
        Ok(())
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
