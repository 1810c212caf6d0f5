/*!
 * Mock engine implementation for testing and offline use.
 *
 * This module provides a dictionary-backed engine that simulates different behaviors:
 * - `MockEngine::working()` - Always succeeds, using the dictionary when it knows the word
 * - `MockEngine::failing_preparation()` - Model can never be made ready
 * - `MockEngine::failing_translation()` - Prepares fine, translate call errors
 * - `MockEngine::slow(ms)` - Model preparation takes `ms` milliseconds
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::LanguagePair;
use crate::providers::TranslationEngine;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Model preparation always fails
    FailingPreparation,
    /// Translate calls always fail
    FailingTranslation,
    /// Translate fails on every Nth call
    Intermittent { fail_every: usize },
    /// Model preparation is slow (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Call counters shared between clones
#[derive(Debug, Default)]
struct CallCounters {
    prepare: AtomicUsize,
    release: AtomicUsize,
    detect: AtomicUsize,
    translate: AtomicUsize,
    peak_prepared: AtomicUsize,
}

/// Dictionary-backed translation engine
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Known translations keyed by (lowercased text, source, target)
    dictionary: Arc<Mutex<HashMap<(String, String, String), String>>>,
    /// What language detection reports; `Err` simulates a detector failure
    detection: Result<Option<String>, ProviderError>,
    /// Pairs currently prepared
    prepared: Arc<Mutex<Vec<LanguagePair>>>,
    /// Call counters
    counters: Arc<CallCounters>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        let engine = Self {
            behavior,
            dictionary: Arc::new(Mutex::new(HashMap::new())),
            detection: Ok(None),
            prepared: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(CallCounters::default()),
        };

        engine
            .with_translation("Hallo", "de", "en", "hello")
            .with_translation("Katze", "de", "en", "cat")
            .with_translation("Hund", "de", "en", "dog")
            .with_translation("Haus", "de", "en", "house")
            .with_translation("Danke", "de", "en", "thank you")
    }

    /// Create a working mock engine
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an engine whose models never become ready
    pub fn failing_preparation() -> Self {
        Self::new(MockBehavior::FailingPreparation)
    }

    /// Create an engine whose translate calls always error
    pub fn failing_translation() -> Self {
        Self::new(MockBehavior::FailingTranslation)
    }

    /// Create an engine failing every Nth translate call
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create an engine with slow model preparation
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Add a dictionary entry
    pub fn with_translation(self, text: &str, source: &str, target: &str, translated: &str) -> Self {
        self.dictionary.lock().insert(
            (text.to_lowercase(), source.to_string(), target.to_string()),
            translated.to_string(),
        );
        self
    }

    /// Set the language detection reports
    pub fn with_detected_language(mut self, code: Option<&str>) -> Self {
        self.detection = Ok(code.map(str::to_string));
        self
    }

    /// Make language detection fail
    pub fn with_failing_detection(mut self) -> Self {
        self.detection = Err(ProviderError::RequestFailed("language identifier crashed".to_string()));
        self
    }

    /// Number of prepare_model calls
    pub fn prepare_calls(&self) -> usize {
        self.counters.prepare.load(Ordering::SeqCst)
    }

    /// Number of release_model calls
    pub fn release_calls(&self) -> usize {
        self.counters.release.load(Ordering::SeqCst)
    }

    /// Number of detect_language calls
    pub fn detect_calls(&self) -> usize {
        self.counters.detect.load(Ordering::SeqCst)
    }

    /// Number of translate calls
    pub fn translate_calls(&self) -> usize {
        self.counters.translate.load(Ordering::SeqCst)
    }

    /// Most pairs that were ever prepared at the same time
    pub fn peak_prepared(&self) -> usize {
        self.counters.peak_prepared.load(Ordering::SeqCst)
    }

    /// Pairs currently prepared
    pub fn prepared_pairs(&self) -> Vec<LanguagePair> {
        self.prepared.lock().clone()
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn prepare_model(&self, pair: &LanguagePair, _allow_metered: bool) -> Result<(), ProviderError> {
        self.counters.prepare.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::FailingPreparation => {
                return Err(ProviderError::ModelNotFound(format!("no model for {}", pair)));
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            _ => {}
        }

        let mut prepared = self.prepared.lock();
        if !prepared.contains(pair) {
            prepared.push(pair.clone());
        }
        self.counters.peak_prepared.fetch_max(prepared.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn release_model(&self, pair: &LanguagePair) {
        self.counters.release.fetch_add(1, Ordering::SeqCst);
        self.prepared.lock().retain(|p| p != pair);
    }

    async fn detect_language(&self, _text: &str) -> Result<Option<String>, ProviderError> {
        self.counters.detect.fetch_add(1, Ordering::SeqCst);
        self.detection.clone()
    }

    async fn translate(&self, pair: &LanguagePair, text: &str) -> Result<String, ProviderError> {
        let count = self.counters.translate.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::FailingTranslation => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "translation backend failure".to_string(),
                });
            }
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                return Err(ProviderError::RequestFailed(format!(
                    "simulated failure on request {}",
                    count + 1
                )));
            }
            _ => {}
        }

        if !self.prepared.lock().contains(pair) {
            return Err(ProviderError::ModelNotFound(format!("model for {} is not loaded", pair)));
        }

        let key = (
            text.to_lowercase(),
            pair.source_language.clone(),
            pair.target_language.clone(),
        );
        let translated = self
            .dictionary
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", pair.target_language, text));

        Ok(translated)
    }
}
