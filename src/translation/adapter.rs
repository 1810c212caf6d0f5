/*!
 * Provider adapter: prepared translation sessions over a `TranslationEngine`.
 *
 * Prepared sessions live in a small LRU arena keyed by normalized language
 * pair. A `SessionHandle` names one of them; handles stay valid until the
 * session is evicted or released. The most recently prepared session is
 * also what `translate_text` uses.
 */

use log::{debug, info, warn};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::app_config::TranslationConfig;
use crate::errors::{AdapterError, PrepareError, ProviderError};
use crate::language_utils::{normalize_for_engine, LanguagePair, UnknownLanguagePolicy};
use crate::providers::TranslationEngine;

/// Default number of sessions kept prepared
pub const DEFAULT_MAX_SESSIONS: usize = 4;

/// Names a prepared session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: u64,
    pair: LanguagePair,
}

impl SessionHandle {
    /// Unique id of the session within its adapter
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Normalized language pair the session translates
    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }
}

struct SessionArena {
    sessions: LruCache<LanguagePair, u64>,
    current: Option<SessionHandle>,
    next_id: u64,
}

impl SessionArena {
    fn is_live(&mut self, handle: &SessionHandle) -> bool {
        self.sessions.get(&handle.pair) == Some(&handle.id)
    }
}

/// Wraps a translation engine with session management and language normalization
pub struct ProviderAdapter {
    engine: Arc<dyn TranslationEngine>,
    policy: UnknownLanguagePolicy,
    arena: Mutex<SessionArena>,
}

impl ProviderAdapter {
    /// Create an adapter keeping at most `max_sessions` prepared sessions
    pub fn new(engine: Arc<dyn TranslationEngine>, policy: UnknownLanguagePolicy, max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);

        Self {
            engine,
            policy,
            arena: Mutex::new(SessionArena {
                sessions: LruCache::new(capacity),
                current: None,
                next_id: 1,
            }),
        }
    }

    /// Create an adapter using the policy and session limit from configuration
    pub fn from_config(engine: Arc<dyn TranslationEngine>, config: &TranslationConfig) -> Self {
        Self::new(engine, config.unknown_language_policy, config.max_prepared_sessions)
    }

    /// Name of the wrapped engine
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Prepare a session for translating from `source` to `target`
    ///
    /// Both codes are normalized to the engine vocabulary first. A pair that is
    /// already prepared is reused.
    ///
    /// The current session is dropped as soon as preparation starts, so after a
    /// failure `translate_text` reports `NotPrepared` instead of translating in
    /// the previous direction. When the arena is full, the least recently used
    /// session is released before the new model is prepared; a failed
    /// preparation therefore still costs that session.
    pub async fn prepare_session(
        &self,
        source: &str,
        target: &str,
        allow_metered: bool,
    ) -> Result<SessionHandle, PrepareError> {
        let mut arena = self.arena.lock().await;
        arena.current = None;

        let pair = LanguagePair::new(self.normalize(source)?, self.normalize(target)?);

        if let Some(&id) = arena.sessions.get(&pair) {
            debug!("Reusing prepared session {} for {}", id, pair);
            let handle = SessionHandle { id, pair };
            arena.current = Some(handle.clone());
            return Ok(handle);
        }

        if arena.sessions.len() >= arena.sessions.cap().get() {
            if let Some((evicted, evicted_id)) = arena.sessions.pop_lru() {
                info!("Releasing session {} for {} (capacity reached)", evicted_id, evicted);
                self.engine.release_model(&evicted).await;
            }
        }

        debug!("Preparing {} model for {}", self.engine.name(), pair);
        self.engine.prepare_model(&pair, allow_metered).await.map_err(|e| {
            warn!("Model preparation failed for {}: {}", pair, e);
            PrepareError::Engine(e)
        })?;

        let id = arena.next_id;
        arena.next_id += 1;
        arena.sessions.put(pair.clone(), id);

        let handle = SessionHandle { id, pair };
        arena.current = Some(handle.clone());
        Ok(handle)
    }

    /// Identify the language of `text`
    ///
    /// Blank input and the undetermined code "und" yield `Ok(None)`.
    pub async fn detect_language(&self, text: &str) -> Result<Option<String>, ProviderError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let detected = self.engine.detect_language(text).await?;
        Ok(detected
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty() && code != "und"))
    }

    /// Translate with the most recently prepared session
    pub async fn translate_text(&self, text: &str) -> Result<String, AdapterError> {
        let handle = self
            .arena
            .lock()
            .await
            .current
            .clone()
            .ok_or(AdapterError::NotPrepared)?;

        self.translate_in(&handle, text).await
    }

    /// Translate with a specific session
    pub async fn translate_in(&self, handle: &SessionHandle, text: &str) -> Result<String, AdapterError> {
        if !self.arena.lock().await.is_live(handle) {
            return Err(AdapterError::NotPrepared);
        }

        let translated = self.engine.translate(&handle.pair, text).await?;
        debug!("Translated '{}' -> '{}' ({})", text, translated, handle.pair);
        Ok(translated)
    }

    /// The session `translate_text` would use
    pub async fn current_session(&self) -> Option<SessionHandle> {
        self.arena.lock().await.current.clone()
    }

    /// Number of prepared sessions
    pub async fn session_count(&self) -> usize {
        self.arena.lock().await.sessions.len()
    }

    /// Release every prepared session
    pub async fn release_all(&self) {
        let mut arena = self.arena.lock().await;
        arena.current = None;

        while let Some((pair, id)) = arena.sessions.pop_lru() {
            debug!("Releasing session {} for {}", id, pair);
            self.engine.release_model(&pair).await;
        }
    }

    fn normalize(&self, code: &str) -> Result<String, PrepareError> {
        normalize_for_engine(code, self.policy)
            .map_err(|_| PrepareError::UnsupportedLanguage(code.to_string()))
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("engine", &self.engine.name())
            .field("policy", &self.policy)
            .finish()
    }
}
