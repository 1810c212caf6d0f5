use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language_utils::{self, UnknownLanguagePolicy, AUTO_DETECT};

/// Longest cache time-to-live accepted from configuration (ten years)
pub const MAX_CACHE_TTL_DAYS: u64 = 3650;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default source language (ISO), also the auto-detect fallback
    #[serde(default = "default_source_language")]
    pub default_source_language: String,

    /// Default target language (ISO)
    #[serde(default = "default_target_language")]
    pub default_target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Database config
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama (local model server)
    #[default]
    Ollama,
    // @provider: Built-in dictionary engine
    Mock,
    // @provider: No engine, cache only
    Disabled,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Mock => "Mock",
            Self::Disabled => "Disabled",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Mock => "mock".to_string(),
            Self::Disabled => "disabled".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            "disabled" | "none" => Ok(Self::Disabled),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Model name (e.g., "llama3.2:3b")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Whether a missing model may be pulled from the registry
    #[serde(default = "default_true")]
    pub allow_model_pull: bool,

    /// HTTP timeout in seconds for a single API call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub max_retries: u32,

    /// Backoff base for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            allow_model_pull: true,
            http_timeout_secs: default_http_timeout_secs(),
            max_retries: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation engine to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Days a cached translation stays fresh
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u64,

    /// Overall budget for resolve + prepare + translate, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether model downloads may use any network class
    #[serde(default = "default_true")]
    pub allow_metered_download: bool,

    /// Handling of language codes outside the engine vocabulary
    #[serde(default)]
    pub unknown_language_policy: UnknownLanguagePolicy,

    /// Number of prepared sessions kept alive at once
    #[serde(default = "default_max_prepared_sessions")]
    pub max_prepared_sessions: usize,

    /// Ollama settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl TranslationConfig {
    /// Cache time-to-live
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_days.saturating_mul(SECONDS_PER_DAY))
    }

    /// Overall request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            cache_ttl_days: default_cache_ttl_days(),
            request_timeout_secs: default_request_timeout_secs(),
            allow_metered_download: true,
            unknown_language_policy: UnknownLanguagePolicy::default(),
            max_prepared_sessions: default_max_prepared_sessions(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "de".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_cache_ttl_days() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_prepared_sessions() -> usize {
    4
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.default_source_language.trim().eq_ignore_ascii_case(AUTO_DETECT) {
            return Err(anyhow!(
                "Default source language must be a concrete code, it is the auto-detect fallback"
            ));
        }

        let _source_name = language_utils::get_language_name(&self.default_source_language)?;
        let _target_name = language_utils::get_language_name(&self.default_target_language)?;

        if !(1..=MAX_CACHE_TTL_DAYS).contains(&self.translation.cache_ttl_days) {
            return Err(anyhow!(
                "cache_ttl_days must be between 1 and {}, got {}",
                MAX_CACHE_TTL_DAYS,
                self.translation.cache_ttl_days
            ));
        }

        if self.translation.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }

        if self.translation.max_prepared_sessions == 0 {
            return Err(anyhow!("max_prepared_sessions must be at least 1"));
        }

        if self.translation.provider == TranslationProvider::Ollama {
            url::Url::parse(&self.translation.ollama.endpoint).with_context(|| {
                format!("Invalid Ollama endpoint: {}", self.translation.ollama.endpoint)
            })?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_source_language: default_source_language(),
            default_target_language: default_target_language(),
            translation: TranslationConfig::default(),
            database: DatabaseConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
