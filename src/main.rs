// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lexicard::app_config::{self, Config, TranslationProvider};
use lexicard::errors::AppError;
use lexicard::language_utils::SourceLanguage;
use lexicard::quiz::QuizMode;
use lexicard::Controller;

/// Default category colour (opaque blue, ARGB)
const DEFAULT_CATEGORY_COLOR: i64 = 0xFF21_96F3;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    Mock,
    Disabled,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
            CliTranslationProvider::Disabled => TranslationProvider::Disabled,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for QuizMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliQuizMode {
    Random,
    Bookmarked,
    Recall,
}

impl From<CliQuizMode> for QuizMode {
    fn from(cli_mode: CliQuizMode) -> Self {
        match cli_mode {
            CliQuizMode::Random => QuizMode::Random,
            CliQuizMode::Bookmarked => QuizMode::Bookmarked,
            CliQuizMode::Recall => QuizMode::Recall,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a word, using the cache when possible
    Translate {
        /// Word or short phrase to translate
        word: String,

        /// Source language code, or 'auto' to detect it
        #[arg(short, long)]
        source_language: Option<String>,

        /// Target language code
        #[arg(short, long)]
        target_language: Option<String>,

        /// Time budget in seconds, overriding the configured timeout
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Detect the language of a text
    Detect {
        /// Text to identify
        text: String,
    },

    /// Inspect or clean the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },

    /// Manage flashcards
    Card {
        #[command(subcommand)]
        action: CardCommand,
    },

    /// Take a multiple-choice quiz over a category
    Quiz {
        /// Category to quiz
        category_id: i64,

        /// Which cards to ask
        #[arg(short, long, value_enum, default_value = "random")]
        mode: CliQuizMode,
    },

    /// Generate shell completions for lexicard
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Show entry counts
    Stats,
    /// Delete every cached translation
    Clear,
    /// Delete translations older than the cache TTL
    Purge,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Create a category for a language pair
    Add {
        /// Category name
        name: String,

        /// Language the cards are written in
        #[arg(short, long)]
        source_language: Option<String>,

        /// Language the cards are translated into
        #[arg(short, long)]
        target_language: Option<String>,

        /// ARGB display colour
        #[arg(long, default_value_t = DEFAULT_CATEGORY_COLOR)]
        color: i64,
    },

    /// List all categories
    List,

    /// Delete a category with all of its cards
    Delete {
        /// Category ID
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CardCommand {
    /// Add a flashcard; its translation is fetched automatically
    Add {
        /// Category the card belongs to
        category_id: i64,

        /// Word in the category's foreign language
        word: String,

        /// Example sentence (repeatable)
        #[arg(long = "example")]
        examples: Vec<String>,

        /// Tag name (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show a flashcard with its examples and tags
    Show {
        /// Flashcard ID
        id: i64,
    },

    /// List the cards of a category
    List {
        /// Category ID
        category_id: i64,
    },

    /// Delete a flashcard
    Delete {
        /// Flashcard ID
        id: i64,
    },

    /// Bookmark a flashcard for bookmarked quizzes
    Bookmark {
        /// Flashcard ID
        id: i64,

        /// Remove the bookmark instead
        #[arg(long)]
        clear: bool,
    },
}

/// Lexicard - vocabulary flashcards with cached translations
///
/// Translations are fetched from a local translation engine and cached
/// for 30 days by default.
#[derive(Parser, Debug)]
#[command(name = "lexicard")]
#[command(version)]
#[command(about = "Vocabulary flashcards with cached translations")]
#[command(long_about = "Lexicard keeps vocabulary flashcards in a local database and fetches their translations from a local model, caching every result.

EXAMPLES:
    lexicard translate Katze                       # Translate with the default language pair
    lexicard translate -s auto -t en Bonjour       # Detect the source language
    lexicard category add Animals -s de -t en      # Create a category
    lexicard card add 1 Hund --example \"Der Hund bellt.\" --tag pets
    lexicard quiz 1 --mode recall                  # Practise the cards you missed
    lexicard cache purge                           # Drop translations past their TTL
    lexicard completions bash > lexicard.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, alias = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Ollama model name
    #[arg(long, global = true)]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::style_for_level(record.level());

            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "lexicard", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    let result = run_command(&controller, cli.command).await;
    controller.shutdown().await;

    if let Err(e) = &result {
        if let Some(AppError::Translation(translation_error)) = e.downcast_ref::<AppError>() {
            if translation_error.is_retryable() {
                warn!("The translation engine did not answer in time, try again");
            }
        }
    }
    result
}

/// Ask the quiz questions on stdin until the quiz ends or input runs out
async fn run_quiz(controller: &Controller, category_id: i64, mode: QuizMode) -> Result<()> {
    let mut quiz = controller.start_quiz(category_id, mode).await?;
    if quiz.is_finished() {
        warn!("No cards to quiz in category {}", category_id);
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(question) = quiz.current_question().cloned() {
        println!("\n[{}/{}] {}", quiz.question_number(), quiz.total_questions(), question.word);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        // Accept the option number or the answer itself
        let answer = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options.get(i).cloned())
            .unwrap_or_else(|| line.trim().to_string());

        let outcome = controller.answer_quiz(&mut quiz, &answer).await?;
        if outcome.correct {
            println!("Correct!");
        } else {
            println!("Wrong, it is '{}'", outcome.correct_answer);
        }
    }

    println!("\nScore: {}/{}", quiz.score(), quiz.total_questions());
    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(Path::new(&cli.config_path))?;

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        config.translation.ollama.model = model.clone();
    }

    if let Some(database) = &cli.database {
        config.database.path = Some(database.clone());
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    let config = controller.config();

    match command {
        Commands::Translate {
            word,
            source_language,
            target_language,
            timeout,
        } => {
            let source: SourceLanguage = source_language
                .as_deref()
                .unwrap_or(&config.default_source_language)
                .parse()?;
            let target = target_language.unwrap_or_else(|| config.default_target_language.clone());

            let translated = controller
                .translate(&word, source, &target, timeout.map(Duration::from_secs))
                .await
                .map_err(AppError::from)?;
            println!("{}", translated);
        }
        Commands::Detect { text } => match controller.detect_language(&text).await.map_err(AppError::from)? {
            Some(code) => println!("{}", code),
            None => {
                warn!("Could not determine the language");
                println!("und");
            }
        },
        Commands::Cache { action } => match action {
            CacheCommand::Stats => {
                let stats = controller.cache_stats().await?;
                println!("Cached translations: {}", stats.total_entries);
                println!("Stale translations:  {}", stats.stale_entries);
                println!("{}", controller.repository().connection().stats()?);
            }
            CacheCommand::Clear => {
                let removed = controller.clear_cache().await?;
                println!("Removed {} cached translations", removed);
            }
            CacheCommand::Purge => {
                let removed = controller.purge_stale_cache().await?;
                println!("Removed {} stale translations", removed);
            }
        },
        Commands::Category { action } => match action {
            CategoryCommand::Add {
                name,
                source_language,
                target_language,
                color,
            } => {
                let source = source_language.unwrap_or_else(|| config.default_source_language.clone());
                let target = target_language.unwrap_or_else(|| config.default_target_language.clone());
                let id = controller.create_category(&name, color, &source, &target).await?;
                println!("{}", id);
            }
            CategoryCommand::List => {
                for category in controller.list_categories().await? {
                    println!(
                        "{}\t{}\t{} -> {}",
                        category.id, category.name, category.foreign_language, category.target_language
                    );
                }
            }
            CategoryCommand::Delete { id } => {
                controller.delete_category(id).await?;
                info!("Deleted category {}", id);
            }
        },
        Commands::Card { action } => match action {
            CardCommand::Add {
                category_id,
                word,
                examples,
                tags,
            } => {
                let outcome = controller.add_flashcard(category_id, &word, examples, tags).await?;
                match (&outcome.translation, &outcome.translation_error) {
                    (Some(translation), _) => info!("Saved '{}' -> '{}'", word, translation),
                    (None, Some(e)) => warn!("Saved '{}' without translation: {}", word, e),
                    (None, None) => info!("Saved '{}'", word),
                }
                println!("{}", outcome.id);
            }
            CardCommand::Show { id } => {
                let details = controller
                    .flashcard_details(id)
                    .await?
                    .with_context(|| format!("Flashcard {} does not exist", id))?;
                println!("{}", serde_json::to_string_pretty(&details)?);
            }
            CardCommand::List { category_id } => {
                for card in controller.list_flashcards(category_id).await? {
                    let marker = if card.is_bookmarked { "*" } else { " " };
                    println!(
                        "{}{}\t{}\t{}",
                        marker,
                        card.id,
                        card.word,
                        card.translation.as_deref().unwrap_or("-")
                    );
                }
            }
            CardCommand::Delete { id } => {
                controller.delete_flashcard(id).await?;
                info!("Deleted flashcard {}", id);
            }
            CardCommand::Bookmark { id, clear } => {
                controller.set_bookmark(id, !clear).await?;
            }
        },
        Commands::Quiz { category_id, mode } => run_quiz(controller, category_id, mode.into()).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
