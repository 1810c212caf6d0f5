use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::database::{CacheStats, Category, Flashcard, FlashcardDetails, Repository};
use crate::errors::{AppError, TranslationError};
use crate::language_utils::{self, SourceLanguage};
use crate::quiz::{AnswerOutcome, Quiz, QuizMode};
use crate::translation::TranslationService;

// @module: Application controller for flashcard and translation flows

/// Result of saving a flashcard
#[derive(Debug)]
pub struct FlashcardOutcome {
    /// Database ID of the saved card
    pub id: i64,
    /// Translation stored with the card
    pub translation: Option<String>,
    /// Why a requested translation could not be fetched
    pub translation_error: Option<TranslationError>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Persistence for cards and the translation cache
    repository: Arc<Repository>,
    // @field: Cache-aside translation
    translation: TranslationService,
}

impl Controller {
    /// Create a new controller for test purposes: in-memory database, mock engine
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.translation.provider = crate::app_config::TranslationProvider::Mock;
        let repository = Arc::new(Repository::new_in_memory()?);
        Ok(Self::with_parts(config, repository))
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate().map_err(|e| AppError::Config(format!("{:#}", e)))?;

        let repository = match &config.database.path {
            Some(path) => Repository::open(path),
            None => Repository::new_default(),
        }
        .map_err(|e| AppError::Database(format!("Failed to open database: {:#}", e)))?;
        info!("Database: {}", repository.connection().path().display());

        Ok(Self::with_parts(config, Arc::new(repository)))
    }

    /// Create a controller over an existing repository
    pub fn with_parts(config: Config, repository: Arc<Repository>) -> Self {
        let translation = TranslationService::from_config(&config, repository.clone());

        Self {
            config,
            repository,
            translation,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying repository
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The translation service
    pub fn translation_service(&self) -> &TranslationService {
        &self.translation
    }

    /// Create a category for a language pair
    pub async fn create_category(
        &self,
        name: &str,
        color: i64,
        foreign_language: &str,
        target_language: &str,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Category name must not be empty"));
        }
        // Cards of an "auto" category are translated from their detected language
        if !SourceLanguage::from(foreign_language).is_auto() {
            language_utils::validate_language_code(foreign_language)
                .with_context(|| format!("Invalid foreign language for category '{}'", name))?;
        }
        language_utils::validate_language_code(target_language)
            .with_context(|| format!("Invalid target language for category '{}'", name))?;

        let category = Category::new(name, color, foreign_language, target_language);
        let id = self.repository.create_category(&category).await?;
        info!("Created category '{}' ({} -> {}) with id {}", name, foreign_language, target_language, id);
        Ok(id)
    }

    /// All categories
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.repository.list_categories().await
    }

    /// Delete a category and, through the schema cascade, all of its cards
    pub async fn delete_category(&self, category_id: i64) -> Result<()> {
        if !self.repository.delete_category(category_id).await? {
            return Err(anyhow!("Category {} does not exist", category_id));
        }
        info!("Deleted category {}", category_id);
        Ok(())
    }

    /// Flashcards of a category
    pub async fn list_flashcards(&self, category_id: i64) -> Result<Vec<Flashcard>> {
        self.require_category(category_id).await?;
        self.repository.list_flashcards(category_id).await
    }

    /// Delete a flashcard with its example sentences and tag links
    pub async fn delete_flashcard(&self, flashcard_id: i64) -> Result<()> {
        if !self.repository.delete_flashcard(flashcard_id).await? {
            return Err(anyhow!("Flashcard {} does not exist", flashcard_id));
        }
        debug!("Deleted flashcard {}", flashcard_id);
        Ok(())
    }

    /// Set or clear the bookmark used by bookmarked quizzes
    pub async fn set_bookmark(&self, flashcard_id: i64, bookmarked: bool) -> Result<()> {
        if !self.repository.set_bookmarked(flashcard_id, bookmarked).await? {
            return Err(anyhow!("Flashcard {} does not exist", flashcard_id));
        }
        Ok(())
    }

    /// Assemble a quiz over the cards of a category
    pub async fn start_quiz(&self, category_id: i64, mode: QuizMode) -> Result<Quiz> {
        let cards = self.list_flashcards(category_id).await?;
        let quiz = Quiz::build(&cards, mode, &mut rand::rng());
        info!(
            "Quiz over category {} ({:?}): {} questions",
            category_id,
            mode,
            quiz.total_questions()
        );
        Ok(quiz)
    }

    /// Answer the current quiz question; wrong answers count against the card
    pub async fn answer_quiz(&self, quiz: &mut Quiz, answer: &str) -> Result<AnswerOutcome> {
        let outcome = quiz.answer(answer).ok_or_else(|| anyhow!("The quiz is already finished"))?;

        if !outcome.correct {
            self.repository.record_incorrect_answer(outcome.flashcard_id).await?;
        }
        Ok(outcome)
    }

    /// Add a flashcard, translating its word with the category's language pair
    ///
    /// A failed translation never loses the card: it is saved without a
    /// translation and the error is reported in the outcome.
    pub async fn add_flashcard(
        &self,
        category_id: i64,
        word: &str,
        examples: Vec<String>,
        tags: Vec<String>,
    ) -> Result<FlashcardOutcome> {
        let word = word.trim();
        if word.is_empty() {
            return Err(anyhow!("Flashcard word must not be empty"));
        }
        let category = self.require_category(category_id).await?;

        let (translation, translation_error) = match self.translate_for(&category, word).await {
            Ok(text) => (Some(text), None),
            Err(e) => {
                warn!("Saving '{}' without translation: {}", word, e);
                (None, Some(e))
            }
        };

        let flashcard = Flashcard::new(category_id, word, translation.clone());
        let id = self
            .repository
            .insert_flashcard_with_details(&flashcard, clean_entries(examples), clean_tags(tags))
            .await?;
        debug!("Saved flashcard {} '{}' in category {}", id, word, category_id);

        Ok(FlashcardOutcome {
            id,
            translation,
            translation_error,
        })
    }

    /// Update a flashcard and replace its example sentences and tags
    ///
    /// With `fetch_translation` the word is translated again; on failure the
    /// previous translation is kept.
    pub async fn update_flashcard(
        &self,
        flashcard: &Flashcard,
        examples: Vec<String>,
        tags: Vec<String>,
        fetch_translation: bool,
    ) -> Result<FlashcardOutcome> {
        let mut flashcard = flashcard.clone();
        flashcard.word = flashcard.word.trim().to_string();
        if flashcard.word.is_empty() {
            return Err(anyhow!("Flashcard word must not be empty"));
        }

        let mut translation_error = None;
        if fetch_translation {
            let category = self.require_category(flashcard.category_id).await?;
            match self.translate_for(&category, &flashcard.word).await {
                Ok(text) => flashcard.translation = Some(text),
                Err(e) => {
                    warn!("Keeping previous translation of '{}': {}", flashcard.word, e);
                    translation_error = Some(e);
                }
            }
        }

        self.repository
            .update_flashcard_with_details(&flashcard, clean_entries(examples), clean_tags(tags))
            .await?;

        Ok(FlashcardOutcome {
            id: flashcard.id,
            translation: flashcard.translation,
            translation_error,
        })
    }

    /// A flashcard with its example sentences and tags
    pub async fn flashcard_details(&self, flashcard_id: i64) -> Result<Option<FlashcardDetails>> {
        self.repository.get_flashcard_details(flashcard_id).await
    }

    /// Translate a word, optionally with a non-default time budget
    pub async fn translate(
        &self,
        word: &str,
        source: SourceLanguage,
        target: &str,
        timeout: Option<Duration>,
    ) -> Result<String, TranslationError> {
        let budget = timeout.unwrap_or_else(|| self.translation.timeout());
        self.translation.translate_with_timeout(word, source, target, budget).await
    }

    /// Identify the language of `text` within the request timeout
    pub async fn detect_language(&self, text: &str) -> Result<Option<String>, TranslationError> {
        let adapter = self
            .translation
            .adapter()
            .ok_or(TranslationError::ProviderUnavailable)?;
        let budget = self.translation.timeout();

        tokio::time::timeout(budget, adapter.detect_language(text))
            .await
            .map_err(|_| TranslationError::Timeout(budget))?
            .map_err(TranslationError::from)
    }

    /// Translation cache statistics under the configured TTL
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let stale_before = self.translation.cache_policy().stale_before(Utc::now());
        self.repository.get_cache_stats(stale_before).await
    }

    /// Delete every cached translation
    pub async fn clear_cache(&self) -> Result<i64> {
        let removed = self.repository.clear_cache().await?;
        info!("Cleared {} cached translations", removed);
        Ok(removed)
    }

    /// Delete cached translations past the configured TTL
    pub async fn purge_stale_cache(&self) -> Result<i64> {
        let stale_before = self.translation.cache_policy().stale_before(Utc::now());
        let removed = self.repository.purge_stale(stale_before).await?;
        info!("Purged {} stale cached translations", removed);
        Ok(removed)
    }

    /// Release engine resources held by prepared sessions
    pub async fn shutdown(&self) {
        if let Some(adapter) = self.translation.adapter() {
            adapter.release_all().await;
        }
    }

    async fn require_category(&self, category_id: i64) -> Result<Category> {
        self.repository
            .get_category(category_id)
            .await?
            .ok_or_else(|| anyhow!("Category {} does not exist", category_id))
    }

    async fn translate_for(&self, category: &Category, word: &str) -> Result<String, TranslationError> {
        let source = SourceLanguage::from(category.foreign_language.as_str());
        self.translation.translate(word, source, &category.target_language).await
    }
}

/// Trimmed, non-empty entries in their original order
fn clean_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Trimmed, non-empty, de-duplicated tag names
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned = clean_entries(tags);
    let mut seen = std::collections::HashSet::new();
    cleaned.retain(|t| seen.insert(t.to_lowercase()));
    cleaned
}
