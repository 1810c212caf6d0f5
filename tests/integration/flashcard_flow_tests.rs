/*!
 * Integration tests for adding and editing flashcards
 */

use anyhow::Result;
use std::sync::Arc;
use lexicard::app_config::{Config, TranslationProvider};
use lexicard::app_controller::Controller;
use lexicard::database::Repository;
use lexicard::errors::TranslationError;
use lexicard::quiz::QuizMode;
use crate::common;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn controller_with_provider(provider: TranslationProvider) -> Result<Controller> {
    let mut config = Config::default();
    config.translation.provider = provider;
    Ok(Controller::with_parts(config, Arc::new(Repository::new_in_memory()?)))
}

#[tokio::test]
async fn test_addFlashcard_withTranslationFailure_shouldStillSaveCard() -> Result<()> {
    common::init_test_logging();
    let controller = controller_with_provider(TranslationProvider::Disabled)?;
    let category_id = controller.create_category("Haus", 0, "de", "en").await?;

    let outcome = controller
        .add_flashcard(category_id, "Tisch", strings(&["Der Tisch ist rund."]), strings(&["furniture"]))
        .await?;

    assert!(outcome.translation.is_none());
    assert!(matches!(outcome.translation_error, Some(TranslationError::ProviderUnavailable)));

    let details = controller.flashcard_details(outcome.id).await?.expect("card should be saved");
    assert_eq!(details.flashcard.word, "Tisch");
    assert!(details.flashcard.translation.is_none());
    assert_eq!(details.examples, strings(&["Der Tisch ist rund."]));
    assert_eq!(details.tags, strings(&["furniture"]));
    Ok(())
}

#[tokio::test]
async fn test_addFlashcard_twiceWithSameWord_shouldTranslateOnceAndShareTags() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;

    let first = controller.add_flashcard(category_id, "Hund", vec![], strings(&["pets", "animals"])).await?;
    let second = controller.add_flashcard(category_id, " Hund ", vec![], strings(&["pets"])).await?;

    assert_ne!(first.id, second.id);
    assert_eq!(first.translation.as_deref(), Some("dog"));
    assert_eq!(second.translation.as_deref(), Some("dog"));

    let stats = controller.cache_stats().await?;
    assert_eq!(stats.total_entries, 1);

    let details = controller.flashcard_details(second.id).await?.unwrap();
    assert_eq!(details.flashcard.word, "Hund");
    assert_eq!(details.tags, strings(&["pets"]));
    Ok(())
}

#[tokio::test]
async fn test_addFlashcard_withAutoCategory_shouldFallBackToDefaultSource() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    // The built-in mock engine cannot detect, so "auto" falls back to the default source "de"
    let category_id = controller.create_category("Gemischt", 0, "auto", "en").await?;

    let outcome = controller.add_flashcard(category_id, "Danke", vec![], vec![]).await?;

    assert_eq!(outcome.translation.as_deref(), Some("thank you"));
    Ok(())
}

#[tokio::test]
async fn test_updateFlashcard_withFailingTranslation_shouldKeepPreviousTranslation() -> Result<()> {
    let repo = Arc::new(Repository::new_in_memory()?);
    let mut mock_config = Config::default();
    mock_config.translation.provider = TranslationProvider::Mock;
    let controller = Controller::with_parts(mock_config, repo.clone());

    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;
    let added = controller
        .add_flashcard(category_id, "Katze", strings(&["Die Katze schläft."]), strings(&["pets"]))
        .await?;

    // Same database, translation disabled
    let mut disabled_config = Config::default();
    disabled_config.translation.provider = TranslationProvider::Disabled;
    let offline = Controller::with_parts(disabled_config, repo);

    let mut card = offline.flashcard_details(added.id).await?.unwrap().flashcard;
    card.word = "Kater".to_string();
    let outcome = offline
        .update_flashcard(&card, strings(&["Der Kater jagt."]), strings(&["pets", "male"]), true)
        .await?;

    assert_eq!(outcome.translation.as_deref(), Some("cat"));
    assert!(outcome.translation_error.is_some());

    let details = offline.flashcard_details(added.id).await?.unwrap();
    assert_eq!(details.flashcard.word, "Kater");
    assert_eq!(details.flashcard.translation.as_deref(), Some("cat"));
    assert_eq!(details.examples, strings(&["Der Kater jagt."]));
    assert_eq!(details.tags, strings(&["male", "pets"]));
    Ok(())
}

#[tokio::test]
async fn test_updateFlashcard_withFetchTranslation_shouldReplaceTranslation() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;
    let added = controller.add_flashcard(category_id, "Katze", vec![], vec![]).await?;

    let mut card = controller.flashcard_details(added.id).await?.unwrap().flashcard;
    card.word = "Hund".to_string();
    let outcome = controller.update_flashcard(&card, vec![], vec![], true).await?;

    assert_eq!(outcome.translation.as_deref(), Some("dog"));
    assert!(outcome.translation_error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_updateFlashcard_withMissingCard_shouldFail() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;

    let mut card = lexicard::database::Flashcard::new(category_id, "Maus", None);
    card.id = 999;

    assert!(controller.update_flashcard(&card, vec![], vec![], false).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_deleteCategory_shouldRemoveItsCards() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let animals = controller.create_category("Tiere", 0, "de", "en").await?;
    let house = controller.create_category("Haus", 0, "de", "en").await?;
    let dog = controller.add_flashcard(animals, "Hund", vec![], strings(&["pets"])).await?;
    controller.add_flashcard(house, "Tisch", vec![], vec![]).await?;

    controller.delete_category(animals).await?;

    let remaining = controller.list_categories().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, house);
    assert!(controller.flashcard_details(dog.id).await?.is_none());
    assert!(controller.list_flashcards(animals).await.is_err());
    assert_eq!(controller.list_flashcards(house).await?.len(), 1);

    assert!(controller.delete_category(animals).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_deleteFlashcard_shouldOnlyRemoveThatCard() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;
    let dog = controller.add_flashcard(category_id, "Hund", vec![], vec![]).await?;
    let cat = controller.add_flashcard(category_id, "Katze", vec![], vec![]).await?;

    controller.delete_flashcard(dog.id).await?;

    let cards = controller.list_flashcards(category_id).await?;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, cat.id);
    assert!(controller.delete_flashcard(dog.id).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_quiz_withBookmarkedMode_shouldAskOnlyBookmarkedCards() -> Result<()> {
    let controller = controller_with_provider(TranslationProvider::Mock)?;
    let category_id = controller.create_category("Tiere", 0, "de", "en").await?;
    let dog = controller.add_flashcard(category_id, "Hund", vec![], vec![]).await?;
    controller.add_flashcard(category_id, "Katze", vec![], vec![]).await?;
    controller.set_bookmark(dog.id, true).await?;

    let mut quiz = controller.start_quiz(category_id, QuizMode::Bookmarked).await?;

    assert_eq!(quiz.total_questions(), 1);
    let question = quiz.current_question().cloned().expect("one question");
    assert_eq!(question.word, "Hund");
    assert!(question.options.contains(&"cat".to_string()));

    let outcome = controller.answer_quiz(&mut quiz, "dog").await?;
    assert!(outcome.correct);
    assert_eq!(quiz.score(), 1);
    assert!(controller.answer_quiz(&mut quiz, "dog").await.is_err());
    Ok(())
}
