use log::{debug, warn};

use crate::language_utils::{normalize_for_engine, SourceLanguage, UnknownLanguagePolicy};
use super::adapter::ProviderAdapter;

/// Outcome of resolving a source language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The concrete language code to translate from
    pub language: String,
    /// Whether the code came from language detection
    pub detected: bool,
}

/// Turns a requested source language into a concrete code
///
/// Detection problems never fail a request: they are logged and the
/// configured default source language is used instead. A detected code is
/// only used when the engine vocabulary knows it, and then in its
/// normalized form ("de-AT" resolves to "de").
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    default_source: String,
}

impl LanguageResolver {
    /// Create a resolver falling back to `default_source`
    pub fn new(default_source: impl Into<String>) -> Self {
        Self {
            default_source: default_source.into(),
        }
    }

    /// The fallback source language
    pub fn default_source(&self) -> &str {
        &self.default_source
    }

    /// Resolve `source` for `text`, detecting the language when requested
    pub async fn resolve(&self, source: &SourceLanguage, text: &str, adapter: &ProviderAdapter) -> Resolution {
        let code = match source {
            SourceLanguage::Explicit(code) => {
                return Resolution {
                    language: code.clone(),
                    detected: false,
                };
            }
            SourceLanguage::AutoDetect => adapter.detect_language(text).await,
        };

        match code {
            Ok(Some(code)) => match normalize_for_engine(&code, UnknownLanguagePolicy::Reject) {
                Ok(language) => {
                    debug!("Detected language '{}' for '{}'", language, text);
                    Resolution {
                        language,
                        detected: true,
                    }
                }
                Err(_) => {
                    warn!(
                        "Detector returned unsupported code '{}', using default source language '{}'",
                        code, self.default_source
                    );
                    self.fallback()
                }
            },
            Ok(None) => {
                warn!(
                    "Could not determine the language of '{}', using default source language '{}'",
                    text, self.default_source
                );
                self.fallback()
            }
            Err(e) => {
                warn!(
                    "Language detection failed: {}, using default source language '{}'",
                    e, self.default_source
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Resolution {
        Resolution {
            language: self.default_source.clone(),
            detected: false,
        }
    }
}
