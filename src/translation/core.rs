/*!
 * Core translation service implementation.
 *
 * `TranslationService` is the cache-aside coordinator: it serves fresh cached
 * translations, and otherwise resolves the source language, prepares a
 * provider session and translates under a single time budget, writing the
 * result back to the store.
 */

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::database::models::{CacheKey, TranslationRecord};
use crate::errors::{AdapterError, TranslationError};
use crate::language_utils::SourceLanguage;
use crate::providers::engine_from_config;
use super::adapter::ProviderAdapter;
use super::cache::{CachePolicy, TranslationStore};
use super::resolver::LanguageResolver;

/// Default overall budget of a translation request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What the timed part of a request produced
enum Fetched {
    /// A fresh record was found under the detected language
    Cached(String),
    /// The provider translated the text
    Translated { source_language: String, text: String },
}

/// Cache-aside translation coordinator
pub struct TranslationService {
    /// Cached translations
    store: Arc<dyn TranslationStore>,

    /// Provider adapter, absent when translation is disabled
    adapter: Option<Arc<ProviderAdapter>>,

    /// Source language resolution
    resolver: LanguageResolver,

    /// Freshness of cached records
    policy: CachePolicy,

    /// Budget for resolve + prepare + translate
    timeout: Duration,

    /// Whether model downloads may use metered networks
    allow_metered: bool,
}

impl TranslationService {
    /// Create a service with default cache policy and timeout
    pub fn new(
        store: Arc<dyn TranslationStore>,
        adapter: Option<Arc<ProviderAdapter>>,
        default_source_language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            adapter,
            resolver: LanguageResolver::new(default_source_language),
            policy: CachePolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            allow_metered: true,
        }
    }

    /// Create a service from configuration, building the configured engine
    pub fn from_config(config: &Config, store: Arc<dyn TranslationStore>) -> Self {
        let adapter = engine_from_config(config)
            .map(|engine| Arc::new(ProviderAdapter::from_config(engine, &config.translation)));

        match &adapter {
            Some(adapter) => info!("Translation provider: {}", adapter.engine_name()),
            None => info!("Translation provider disabled"),
        }

        Self::new(store, adapter, config.default_source_language.clone())
            .with_cache_policy(CachePolicy::new(config.translation.cache_ttl()))
            .with_timeout(config.translation.request_timeout())
            .with_allow_metered(config.translation.allow_metered_download)
    }

    /// Set the cache policy
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set whether model downloads may use metered networks
    pub fn with_allow_metered(mut self, allow_metered: bool) -> Self {
        self.allow_metered = allow_metered;
        self
    }

    /// The configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The cache policy in use
    pub fn cache_policy(&self) -> CachePolicy {
        self.policy
    }

    /// The provider adapter, if translation is enabled
    pub fn adapter(&self) -> Option<&Arc<ProviderAdapter>> {
        self.adapter.as_ref()
    }

    /// Translate `word` using the configured timeout
    pub async fn translate(
        &self,
        word: &str,
        source: SourceLanguage,
        target: &str,
    ) -> Result<String, TranslationError> {
        self.translate_with_timeout(word, source, target, self.timeout).await
    }

    /// Translate `word` within `budget`
    ///
    /// A fresh cache hit returns without touching the provider. Otherwise
    /// language resolution, session preparation and translation share the
    /// budget, and a successful translation is written back to the store.
    pub async fn translate_with_timeout(
        &self,
        word: &str,
        source: SourceLanguage,
        target: &str,
        budget: Duration,
    ) -> Result<String, TranslationError> {
        let requested = CacheKey::new(word, source.as_str(), target);
        if let Some(cached) = self.fresh_cached(&requested).await {
            return Ok(cached);
        }

        let adapter = self.adapter.as_ref().ok_or(TranslationError::ProviderUnavailable)?;

        let fetched = tokio::time::timeout(budget, self.fetch(adapter, word, &source, target))
            .await
            .map_err(|_| {
                warn!("Translation of '{}' timed out after {:?}", word, budget);
                TranslationError::Timeout(budget)
            })??;

        match fetched {
            Fetched::Cached(text) => Ok(text),
            Fetched::Translated { source_language, text } => {
                let record = TranslationRecord::with_timestamp(word, source_language, target, &text, Utc::now());
                if let Err(e) = self.store.put(&record).await {
                    warn!("Failed to cache translation of '{}': {}", word, e);
                }
                Ok(text)
            }
        }
    }

    /// Resolve, prepare and translate; runs under the request timeout
    async fn fetch(
        &self,
        adapter: &ProviderAdapter,
        word: &str,
        source: &SourceLanguage,
        target: &str,
    ) -> Result<Fetched, TranslationError> {
        let resolution = self.resolver.resolve(source, word, adapter).await;

        if resolution.detected {
            let detected = CacheKey::new(word, &resolution.language, target);
            if let Some(cached) = self.fresh_cached(&detected).await {
                return Ok(Fetched::Cached(cached));
            }
        }

        let session = adapter
            .prepare_session(&resolution.language, target, self.allow_metered)
            .await
            .map_err(|e| TranslationError::ModelUnavailable {
                source_language: resolution.language.clone(),
                target_language: target.to_string(),
                reason: e.to_string(),
            })?;

        let text = adapter.translate_in(&session, word).await.map_err(|e| match e {
            AdapterError::Provider(provider) => TranslationError::Provider(provider),
            // Evicted by a concurrent preparation between prepare and translate
            AdapterError::NotPrepared => TranslationError::ModelUnavailable {
                source_language: resolution.language.clone(),
                target_language: target.to_string(),
                reason: AdapterError::NotPrepared.to_string(),
            },
        })?;

        Ok(Fetched::Translated {
            source_language: resolution.language,
            text,
        })
    }

    /// A fresh cached translation for `key`; read errors count as a miss
    async fn fresh_cached(&self, key: &CacheKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(Some(record)) if self.policy.is_fresh(&record, Utc::now()) => {
                debug!("Serving cached translation for '{}'", key.source_text);
                Some(record.translated_text)
            }
            Ok(Some(_)) => {
                debug!("Cached translation for '{}' is stale", key.source_text);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Translation cache lookup failed for '{}': {}", key.source_text, e);
                None
            }
        }
    }
}
