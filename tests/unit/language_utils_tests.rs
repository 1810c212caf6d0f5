/*!
 * Tests for language utility functions
 */

use lexicard::language_utils::{
    get_language_name, is_known_language_tag, normalize_for_engine,
    normalize_to_part1_or_part2t, normalize_to_part2t, validate_language_code, LanguageCodeType,
    LanguagePair, SourceLanguage, UnknownLanguagePolicy, SUPPORTED_LANGUAGES,
};

/// Test validation of language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldReturnCorrectType() {
    assert!(matches!(validate_language_code("de").unwrap(), LanguageCodeType::Part1));
    assert!(matches!(validate_language_code("deu").unwrap(), LanguageCodeType::Part2T));
    assert!(matches!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B));
    assert!(matches!(validate_language_code(" EN ").unwrap(), LanguageCodeType::Part1));

    assert!(validate_language_code("xyz").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("auto").is_err());
}

/// Test normalization of language codes
#[test]
fn test_normalize_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
}

/// Test language display names
#[test]
fn test_get_language_name_withKnownCode_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert!(get_language_name("zz").is_err());
}

#[test]
fn test_normalizeForEngine_withEveryListedCode_shouldBeIdentity() {
    for code in SUPPORTED_LANGUAGES {
        assert_eq!(
            normalize_for_engine(code, UnknownLanguagePolicy::Reject).unwrap(),
            *code,
            "{} should map to itself",
            code
        );
    }
}

#[test]
fn test_normalizeForEngine_withLegacyCodes_shouldMapToEngineVocabulary() {
    let policy = UnknownLanguagePolicy::Reject;
    assert_eq!(normalize_for_engine("iw", policy).unwrap(), "he");
    assert_eq!(normalize_for_engine("nn-NO", policy).unwrap(), "no");
    assert_eq!(normalize_for_engine("fra", policy).unwrap(), "fr");
    assert_eq!(normalize_for_engine("zh-Hant", policy).unwrap(), "zh");
}

#[test]
fn test_sourceLanguage_display_shouldRoundTripAutoSentinel() {
    assert_eq!(SourceLanguage::AutoDetect.to_string(), "auto");
    assert_eq!(SourceLanguage::from("Auto"), SourceLanguage::AutoDetect);
    assert_eq!(SourceLanguage::from("de").as_str(), "de");
    assert!(!SourceLanguage::explicit("de").is_auto());
}

#[test]
fn test_isKnownLanguageTag_withDetectorOutputs_shouldClassify() {
    assert!(is_known_language_tag("fr"));
    assert!(is_known_language_tag("pt-BR"));
    assert!(!is_known_language_tag("und"));
    assert!(!is_known_language_tag("  "));
}

#[test]
fn test_languagePair_display_shouldUseArrow() {
    assert_eq!(LanguagePair::new("de", "en").to_string(), "de -> en");
}
