/*!
 * Multiple-choice quizzes over the flashcards of a category.
 *
 * A quiz asks for the translation of up to `MAX_QUESTIONS` cards. Each
 * question offers the correct translation together with up to
 * `DISTRACTORS_PER_QUESTION` other translations from the same category.
 */

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::database::Flashcard;

/// Most questions in one quiz
pub const MAX_QUESTIONS: usize = 20;

/// Wrong options offered next to the correct answer
pub const DISTRACTORS_PER_QUESTION: usize = 3;

/// Which cards a quiz draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Every card of the category
    #[default]
    Random,
    /// Bookmarked cards only
    Bookmarked,
    /// Cards answered wrongly before
    Recall,
}

impl QuizMode {
    fn includes(self, card: &Flashcard) -> bool {
        match self {
            Self::Random => true,
            Self::Bookmarked => card.is_bookmarked,
            Self::Recall => card.incorrect_count > 0,
        }
    }
}

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizQuestion {
    /// Card being asked
    pub flashcard_id: i64,
    /// Word to translate
    pub word: String,
    /// Shuffled options, the correct answer among them
    pub options: Vec<String>,
    /// The card's translation
    pub correct_answer: String,
}

/// Result of answering the current question
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    /// Card the question was about
    pub flashcard_id: i64,
    /// Whether the answer matched
    pub correct: bool,
    /// The expected answer
    pub correct_answer: String,
}

/// A quiz in progress
#[derive(Debug, Clone)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
    position: usize,
    score: usize,
}

impl Quiz {
    /// Assemble a quiz from the cards of one category
    ///
    /// Cards without a translation cannot be asked and are skipped, but
    /// every distinct translation in `cards` may serve as a distractor.
    pub fn build<R: Rng + ?Sized>(cards: &[Flashcard], mode: QuizMode, rng: &mut R) -> Self {
        let mut translations: Vec<&str> = Vec::new();
        for translation in cards.iter().filter_map(|c| c.translation.as_deref()) {
            if !translations.contains(&translation) {
                translations.push(translation);
            }
        }

        let mut asked: Vec<&Flashcard> = cards
            .iter()
            .filter(|c| c.translation.is_some() && mode.includes(c))
            .collect();
        asked.shuffle(rng);
        asked.truncate(MAX_QUESTIONS);

        let questions = asked
            .into_iter()
            .filter_map(|card| {
                let correct_answer = card.translation.clone()?;
                let mut wrong: Vec<&str> = translations
                    .iter()
                    .copied()
                    .filter(|t| *t != correct_answer)
                    .collect();
                wrong.shuffle(rng);
                wrong.truncate(DISTRACTORS_PER_QUESTION);

                let mut options: Vec<String> = wrong.into_iter().map(str::to_string).collect();
                options.push(correct_answer.clone());
                options.shuffle(rng);

                Some(QuizQuestion {
                    flashcard_id: card.id,
                    word: card.word.clone(),
                    options,
                    correct_answer,
                })
            })
            .collect();

        Self {
            questions,
            position: 0,
            score: 0,
        }
    }

    /// The question waiting for an answer, `None` once finished
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.position)
    }

    /// Answer the current question and move on to the next one
    pub fn answer(&mut self, answer: &str) -> Option<AnswerOutcome> {
        let question = self.questions.get(self.position)?;
        let correct = answer.trim() == question.correct_answer;
        let outcome = AnswerOutcome {
            flashcard_id: question.flashcard_id,
            correct,
            correct_answer: question.correct_answer.clone(),
        };

        if correct {
            self.score += 1;
        }
        self.position += 1;
        Some(outcome)
    }

    /// Number of the current question, starting at 1
    pub fn question_number(&self) -> usize {
        self.position + 1
    }

    /// Number of questions in the quiz
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Correct answers so far
    pub fn score(&self) -> usize {
        self.score
    }

    /// Whether every question has been answered
    pub fn is_finished(&self) -> bool {
        self.position >= self.questions.len()
    }
}
