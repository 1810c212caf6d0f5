use async_trait::async_trait;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

use crate::app_config::OllamaConfig;
use crate::errors::ProviderError;
use crate::language_utils::{is_known_language_tag, language_name, LanguagePair, SUPPORTED_LANGUAGES};
use crate::providers::TranslationEngine;

/// Default Ollama endpoint, used when the configured one cannot be parsed
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// ISO 639 looking tokens in a detector answer
static LANGUAGE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z]{2,3})\b").expect("valid language code regex"));

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Model list returned by `/api/tags`
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// One installed model
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Pull request for `/api/pull`
#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

/// Final status of a non-streaming pull
#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
            keep_alive: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling options
    pub fn options(mut self, temperature: f32, num_predict: u32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
            num_predict: Some(num_predict),
        });
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

impl Ollama {
    /// Create a new Ollama client for an endpoint such as `http://localhost:11434`
    pub fn new(endpoint: &str, http_timeout: Duration, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            base_url: normalize_base_url(endpoint),
            client: Client::builder()
                .timeout(http_timeout)
                // Ollama speaks HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// The normalized API base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Ollama URL for {}: {}", path, e)))
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = self.endpoint("api/generate")?;

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(url.clone()).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await.map_err(|e| {
                            ProviderError::RequestFailed(format!("Failed to read Ollama response: {}", e))
                        })?;
                        return parse_generation_response(&text);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let api_error = ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message,
                    };

                    if !status.is_server_error() {
                        // Client error - don't retry
                        error!("Ollama API error ({}): {}", status, api_error);
                        return Err(api_error);
                    }

                    error!(
                        "Ollama API error ({}) - attempt {}/{}",
                        status,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(api_error);
                }
                Err(e) => {
                    error!(
                        "Ollama API network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(map_transport_error(e));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Names of the installed models
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.endpoint("api/tags")?;
        let response = self.client.get(url).send().await.map_err(map_transport_error)?;
        let tags: TagsResponse = read_json(response).await?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Download a model, waiting until the pull completes
    pub async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        let url = self.endpoint("api/pull")?;
        let request = PullRequest { model, stream: false };

        // Downloads take far longer than regular calls
        let response = self
            .client
            .post(url)
            .timeout(Duration::from_secs(60 * 60))
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let pull: PullResponse = read_json(response).await?;

        if pull.status == "success" {
            Ok(())
        } else {
            Err(ProviderError::ModelNotFound(format!(
                "pull of '{}' ended with status '{}'",
                model, pull.status
            )))
        }
    }
}

/// Translation engine backed by a local Ollama model
#[derive(Debug)]
pub struct OllamaEngine {
    /// API client
    client: Ollama,
    /// Model used for detection and translation
    model: String,
    /// Whether a missing model may be pulled
    allow_model_pull: bool,
    /// Whether the model is known to be installed
    installed: AtomicBool,
    /// Pairs currently prepared; the model is unloaded when this empties
    prepared: Mutex<HashSet<LanguagePair>>,
}

impl OllamaEngine {
    /// Create an engine for the given client and model
    pub fn new(client: Ollama, model: impl Into<String>, allow_model_pull: bool) -> Self {
        Self {
            client,
            model: model.into(),
            allow_model_pull,
            installed: AtomicBool::new(false),
            prepared: Mutex::new(HashSet::new()),
        }
    }

    /// Create an engine from configuration
    pub fn from_config(config: &OllamaConfig) -> Self {
        let client = Ollama::new(
            &config.endpoint,
            Duration::from_secs(config.http_timeout_secs),
            config.max_retries,
            config.retry_backoff_ms,
        );
        Self::new(client, config.model.clone(), config.allow_model_pull)
    }

    async fn ensure_installed(&self, allow_metered: bool) -> Result<(), ProviderError> {
        if self.installed.load(Ordering::Acquire) {
            return Ok(());
        }

        let models = self.client.list_models().await?;
        if models.iter().any(|name| model_matches(name, &self.model)) {
            self.installed.store(true, Ordering::Release);
            return Ok(());
        }

        if !self.allow_model_pull {
            return Err(ProviderError::ModelNotFound(self.model.clone()));
        }
        if !allow_metered {
            return Err(ProviderError::DownloadRefused(format!(
                "'{}' must be downloaded and metered networks are not allowed",
                self.model
            )));
        }

        info!("Pulling Ollama model '{}'", self.model);
        self.client.pull_model(&self.model).await?;
        self.installed.store(true, Ordering::Release);
        info!("Model downloaded: {}", self.model);
        Ok(())
    }
}

#[async_trait]
impl TranslationEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn prepare_model(&self, pair: &LanguagePair, allow_metered: bool) -> Result<(), ProviderError> {
        self.ensure_installed(allow_metered).await?;

        // An empty prompt loads the model into memory
        let warmup = GenerationRequest::new(&self.model, "").keep_alive("10m");
        self.client.generate(&warmup).await?;

        self.prepared.lock().insert(pair.clone());
        debug!("Ollama model '{}' ready for {}", self.model, pair);
        Ok(())
    }

    async fn release_model(&self, pair: &LanguagePair) {
        let now_empty = {
            let mut prepared = self.prepared.lock();
            prepared.remove(pair);
            prepared.is_empty()
        };

        if now_empty {
            let unload = GenerationRequest::new(&self.model, "").keep_alive("0");
            if let Err(e) = self.client.generate(&unload).await {
                warn!("Failed to unload Ollama model '{}': {}", self.model, e);
            }
        }
    }

    async fn detect_language(&self, text: &str) -> Result<Option<String>, ProviderError> {
        let request = GenerationRequest::new(
            &self.model,
            format!("Text: {}", text),
        )
        .system(
            "Identify the language of the user's text. Answer with its two-letter ISO 639-1 \
             code only. Answer 'und' if the language cannot be determined.",
        )
        .options(0.0, 8);

        let response = self.client.generate(&request).await?;
        let detected = extract_language_code(&response.response);
        debug!("detectLanguage: text='{}' detected={:?}", text, detected);
        Ok(detected)
    }

    async fn translate(&self, pair: &LanguagePair, text: &str) -> Result<String, ProviderError> {
        let system = format!(
            "You are a dictionary. Translate the user's text from {} to {}. \
             Reply with the translation only, without quotes or explanations.",
            language_name(&pair.source_language),
            language_name(&pair.target_language),
        );
        let request = GenerationRequest::new(&self.model, text)
            .system(system)
            .options(0.1, 128);

        let response = self.client.generate(&request).await?;
        let translated = clean_translation(&response.response);

        if translated.is_empty() {
            return Err(ProviderError::ParseError("Ollama returned an empty translation".to_string()));
        }
        if translated.eq_ignore_ascii_case(text) {
            warn!("Translated text equals input, possible model/language mismatch");
        }

        Ok(translated)
    }
}

/// Parse a base URL, adding a scheme when missing and a trailing slash for `join`
fn normalize_base_url(endpoint: &str) -> Url {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    Url::parse(&format!("{}/", with_scheme)).unwrap_or_else(|e| {
        warn!("Invalid Ollama endpoint '{}' ({}), using {}", endpoint, e, DEFAULT_BASE_URL);
        Url::parse(&format!("{}/", DEFAULT_BASE_URL)).expect("default Ollama URL is valid")
    })
}

/// `llama3.2` matches the installed `llama3.2:latest`
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted || (!wanted.contains(':') && installed == format!("{}:latest", wanted))
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_connect() || e.is_timeout() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if status != StatusCode::OK {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

/// Parse a generate response, tolerating JSONL output from streaming servers
fn parse_generation_response(text: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(text) {
        return Ok(response);
    }

    let mut model = String::new();
    let mut full_response = String::new();
    let mut done = false;
    let mut parsed_any = false;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let chunk: GenerationResponse = serde_json::from_str(line)
            .map_err(|e| ProviderError::ParseError(format!("Invalid Ollama response line: {}", e)))?;
        parsed_any = true;
        model = chunk.model;
        full_response.push_str(&chunk.response);
        done |= chunk.done;
    }

    if !parsed_any {
        return Err(ProviderError::ParseError("Empty Ollama response".to_string()));
    }

    Ok(GenerationResponse {
        model,
        response: full_response,
        done,
    })
}

/// Pull a language code out of a detector answer; `und` and blanks become `None`
///
/// Models tend to put the code at the end of a sentence ("It is German: de"),
/// so tokens are scanned from the back. A supported code wins over any other
/// ISO looking word.
fn extract_language_code(answer: &str) -> Option<String> {
    let tokens: Vec<String> = LANGUAGE_CODE_RE
        .captures_iter(answer)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect();

    if let Some(code) = tokens.iter().rev().find(|t| SUPPORTED_LANGUAGES.contains(&t.as_str())) {
        return Some(code.clone());
    }
    if tokens.iter().any(|t| t == "und") {
        return None;
    }
    tokens.into_iter().rev().find(|t| is_known_language_tag(t))
}

/// First non-empty line of the answer, without surrounding quotes
fn clean_translation(answer: &str) -> String {
    answer
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”' || c == '„')
        .trim()
        .to_string()
}
