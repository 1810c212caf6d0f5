/*!
 * Error types for the lexicard library.
 *
 * This module contains custom error types for the different layers of the
 * translation flow, using the thiserror crate for ergonomic error definitions.
 * Application plumbing uses `anyhow`. Controller construction failures and
 * translation failures reach the CLI as `AppError`.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a translation engine (model server, on-device model, mock)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The requested model is not installed and could not be fetched
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A model download was needed but is not allowed on this network
    #[error("Model download refused: {0}")]
    DownloadRefused(String),
}

/// Reasons a provider session could not be prepared
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepareError {
    /// The language code is outside the engine's vocabulary
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// The engine failed to make the model ready
    #[error("Engine failed to prepare model: {0}")]
    Engine(#[from] ProviderError),
}

/// Errors from the provider adapter's translate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// No session has been prepared, or the session was released
    #[error("Translator not prepared")]
    NotPrepared,

    /// The engine failed during the translate call
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors surfaced to callers of the translation service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// No translation backend is configured
    #[error("Translation provider not available")]
    ProviderUnavailable,

    /// The backend could not ready itself for the language pair
    #[error("Translation model unavailable for {source_language} -> {target_language}: {reason}")]
    ModelUnavailable {
        /// Source language of the requested pair
        source_language: String,
        /// Target language of the requested pair
        target_language: String,
        /// Why preparation failed
        reason: String,
    },

    /// The time budget elapsed before a result was produced
    #[error("Translation timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// The backend failed during the translate call itself
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TranslationError {
    /// Whether a caller should offer a "try again" affordance
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Top-level error returned by the controller and the CLI
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the persistence layer
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
}
