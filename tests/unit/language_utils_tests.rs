/*!
 * Tests for language utility functions
 */

use doctrans::language_utils::{
    Script, detect_script, get_language_name, normalize_to_part2t, text_matches_language,
};

/// Test normalization of the language pair codes to ISO 639-2/T
#[test]
fn test_normalizeToPart2t_withPairCodes_shouldNormalize() {
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t(" ZH ").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
    assert!(normalize_to_part2t("zz").is_err());
}

/// Test that language names used in prompts are English names
#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("eng").unwrap(), "English");
    assert!(get_language_name("").is_err());
}

/// Test that kanji-only fragments of Japanese text still read as Japanese when kana appear
#[test]
fn test_detectScript_withMixedDocument_shouldPreferJapanese() {
    let text = "東京都庁舎の建設計画について。概要を説明する。";
    assert_eq!(detect_script(text), Script::Japanese);
    assert_eq!(detect_script(""), Script::Other);
}

/// Test that languages outside the CJK pair are never flagged
#[test]
fn test_textMatchesLanguage_withOtherLanguage_shouldPass() {
    assert!(text_matches_language("Bonjour tout le monde", "fr"));
    assert!(!text_matches_language("日本語", "not-a-code"));
}
