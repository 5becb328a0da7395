//! Language utilities for ISO 639 codes and source-script sniffing.
//!
//! Codes are accepted in ISO 639-1 (2-letter), ISO 639-2/T or ISO 639-2/B
//! (3-letter) form and normalized to ISO 639-2/T for comparison.

use anyhow::{Result, anyhow};
use isolang::Language;
use std::fmt;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterparts
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
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

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if bibliographic_to_terminology(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match validate_language_code(&normalized_code) {
        Ok(LanguageCodeType::Part1) => Language::from_639_1(&normalized_code)
            .map(|lang| lang.to_639_3().to_string())
            .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code)),
        Ok(LanguageCodeType::Part2T) => Ok(normalized_code),
        Ok(LanguageCodeType::Part2B) => bibliographic_to_terminology(&normalized_code)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code)),
        Err(_) => Err(anyhow!("Cannot normalize invalid language code: {}", code)),
    }
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Dominant script of a text sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Japanese,
    Chinese,
    Other,
}

impl Script {
    /// ISO 639-2/T code of the language this script usually indicates
    pub fn language_code(&self) -> Option<&'static str> {
        match self {
            Self::Japanese => Some("jpn"),
            Self::Chinese => Some("zho"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Japanese => write!(f, "Japanese"),
            Self::Chinese => write!(f, "Chinese"),
            Self::Other => write!(f, "other"),
        }
    }
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// Classify text by kana and han counts.
///
/// Any meaningful kana share means Japanese, since Chinese text never uses it.
pub fn detect_script(text: &str) -> Script {
    let (kana, han) = text.chars().fold((0usize, 0usize), |(kana, han), c| {
        if is_kana(c) {
            (kana + 1, han)
        } else if is_han(c) {
            (kana, han + 1)
        } else {
            (kana, han)
        }
    });

    if kana + han == 0 {
        return Script::Other;
    }
    if kana * 20 >= kana + han {
        Script::Japanese
    } else if han > 0 {
        Script::Chinese
    } else {
        Script::Other
    }
}

/// Whether `text` looks like it is written in `language_code`.
///
/// Languages outside the Japanese/Chinese pair always pass.
pub fn text_matches_language(text: &str, language_code: &str) -> bool {
    let Ok(expected) = normalize_to_part2t(language_code) else {
        return false;
    };
    match expected.as_str() {
        "jpn" | "zho" => detect_script(text).language_code() == Some(expected.as_str()),
        _ => true,
    }
}
