use anyhow::{Result, anyhow};
use isolang::Language;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating, normalizing, and
/// matching ISO 639-1 (2-letter) and ISO 639-2 (3-letter) language codes,
/// plus the language vocabulary understood by translation engines.

/// Sentinel accepted at string boundaries for "detect the source language"
pub const AUTO_DETECT: &str = "auto";

/// Language the engine vocabulary falls back to under `FallbackToEnglish`
pub const FALLBACK_LANGUAGE: &str = "en";

/// ISO 639-1 codes translation engines are expected to support
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ar", "bg", "cs", "da", "de", "el", "en", "es", "fi", "fr", "he", "hi", "hu", "it", "ja",
    "ko", "nl", "no", "pl", "pt", "ro", "ru", "sk", "sv", "th", "tr", "uk", "vi", "zh",
];

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// What to do with a code outside the engine vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLanguagePolicy {
    /// Fail preparation with an unsupported-language error
    #[default]
    Reject,
    /// Silently translate as English, logging a warning
    FallbackToEnglish,
}

/// Source language of a translation request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// A concrete language code, passed through unchanged
    Explicit(String),
    /// Ask the engine to identify the language of the input text
    AutoDetect,
}

impl SourceLanguage {
    /// Create an explicit source language
    pub fn explicit(code: impl Into<String>) -> Self {
        Self::Explicit(code.into())
    }

    /// Whether the language must be detected
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::AutoDetect)
    }

    /// The string form used in cache keys and logs
    pub fn as_str(&self) -> &str {
        match self {
            Self::Explicit(code) => code,
            Self::AutoDetect => AUTO_DETECT,
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if trimmed.eq_ignore_ascii_case(AUTO_DETECT) {
            Ok(Self::AutoDetect)
        } else {
            Ok(Self::Explicit(trimmed.to_string()))
        }
    }
}

impl From<&str> for SourceLanguage {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| Self::Explicit(s.to_string()))
    }
}

/// A translation direction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

impl LanguagePair {
    /// Create a new language pair
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_language, self.target_language)
    }
}

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if part2b_to_part2t(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = part2b_to_part2t(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or(part2t))
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Display name for a code, or the code itself when it is not recognised
pub fn language_name(code: &str) -> String {
    get_language_name(primary_subtag(code)).unwrap_or_else(|_| code.to_string())
}

/// Whether a tag such as "de", "deu" or "zh-Hant" names a known ISO 639 language
pub fn is_known_language_tag(code: &str) -> bool {
    let primary = primary_subtag(code).to_lowercase();
    !primary.is_empty()
        && !matches!(primary.as_str(), "und" | "mis" | "mul" | "zxx")
        && validate_language_code(&primary).is_ok()
}

/// Strip region and script subtags from a BCP 47 style tag ("de-AT" -> "de")
fn primary_subtag(code: &str) -> &str {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
}

/// Normalize a code to the engine vocabulary (`SUPPORTED_LANGUAGES`)
///
/// Accepts ISO 639-1, ISO 639-2/T and /B codes and BCP 47 tags. Codes outside
/// the vocabulary are rejected or mapped to English depending on `policy`.
pub fn normalize_for_engine(code: &str, policy: UnknownLanguagePolicy) -> Result<String> {
    let primary = primary_subtag(code).to_lowercase();

    let candidate = match primary.as_str() {
        // Norwegian Bokmal and Nynorsk share the engine's Norwegian model
        "nb" | "nn" => Some("no".to_string()),
        "iw" => Some("he".to_string()),
        _ => normalize_to_part1_or_part2t(&primary).ok(),
    };

    if let Some(candidate) = candidate {
        if SUPPORTED_LANGUAGES.contains(&candidate.as_str()) {
            return Ok(candidate);
        }
    }

    match policy {
        UnknownLanguagePolicy::Reject => Err(anyhow!("Unsupported language code: {}", code)),
        UnknownLanguagePolicy::FallbackToEnglish => {
            warn!("Unknown language code: {}, defaulting to {}", code, FALLBACK_LANGUAGE);
            Ok(FALLBACK_LANGUAGE.to_string())
        }
    }
}
