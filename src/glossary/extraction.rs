/*!
 * Candidate term extraction.
 *
 * Finds proper nouns and recurring terms in Japanese text so they can be
 * reviewed in a temp dictionary before translation:
 * - Katakana runs (loanwords and foreign names)
 * - Names followed by an honorific suffix, with the suffix stripped
 * - Kanji compounds that recur in the document
 * - Capitalized Latin words that recur in the document
 *
 * Extraction is offline and pure: it never touches the dictionaries or disk.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

static KATAKANA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ァ-ヶー]{2,}").expect("katakana pattern is valid"));

static HONORIFIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([一-龯々ァ-ヶー]{1,8})(さん|くん|君|様|先生|氏)").expect("honorific pattern is valid")
});

static KANJI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[一-龯々]{2,}").expect("kanji pattern is valid"));

static LATIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Za-z]+\b").expect("latin pattern is valid"));

/// Particles, pronouns and set phrases that are never terms
const JAPANESE_STOPWORDS: &[&str] = &[
    "の", "に", "は", "を", "た", "が", "で", "て", "と", "も", "な", "ない", "から", "まで",
    "より", "など", "これ", "それ", "あれ", "この", "その", "あの", "ここ", "そこ", "あそこ",
    "わたし", "あなた", "かれ", "かのじょ", "です", "ます", "でした", "ました", "である", "だ",
    "だった", "ください", "ございます", "ありがとう", "すみません", "おはよう", "こんにちは",
    "こんばんは", "さようなら", "いいえ", "はい", "ええ", "そう", "そうです", "どう", "どうぞ",
    "どうも", "もう", "まだ", "また", "いつ", "どこ", "だれ", "なに", "なぜ", "どんな", "どの",
    "今日", "明日", "昨日", "自分", "時間", "今回",
];

/// Latin words that start sentences rather than name things
const LATIN_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "It", "He", "She", "They", "We", "You", "And",
    "But", "Or", "If", "In", "On", "At", "For", "With", "Yes", "No", "OK",
];

/// Configuration for candidate term extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Minimum term length in characters
    #[serde(default = "default_min_length", alias = "min_term_length")]
    pub min_length: usize,

    /// Minimum occurrences for kanji compounds and Latin words
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,

    /// Additional words to exclude on top of the built-in stopwords
    #[serde(default)]
    pub exclude_words: Vec<String>,
}

fn default_min_length() -> usize {
    2
}

fn default_min_occurrences() -> usize {
    2
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            min_occurrences: default_min_occurrences(),
            exclude_words: Vec::new(),
        }
    }
}

/// Extracts candidate terms according to an `ExtractionConfig`.
#[derive(Debug, Clone)]
pub struct TermExtractor {
    config: ExtractionConfig,
    excluded: HashSet<String>,
}

impl TermExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        let excluded = JAPANESE_STOPWORDS
            .iter()
            .chain(LATIN_STOPWORDS.iter())
            .map(|w| w.to_string())
            .chain(config.exclude_words.iter().cloned())
            .collect();

        Self { config, excluded }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the candidate terms of `text`, sorted and deduplicated
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut terms = BTreeSet::new();

        for m in KATAKANA_PATTERN.find_iter(text) {
            let word = m.as_str();
            if word.chars().all(|c| c == 'ー') {
                continue;
            }
            self.accept(word, &mut terms);
        }

        for caps in HONORIFIC_PATTERN.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                self.accept(name.as_str(), &mut terms);
            }
        }

        for word in self.recurring(&KANJI_PATTERN, text) {
            self.accept(&word, &mut terms);
        }

        for word in self.recurring(&LATIN_PATTERN, text) {
            self.accept(&word, &mut terms);
        }

        terms
    }

    fn recurring(&self, pattern: &Regex, text: &str) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for m in pattern.find_iter(text) {
            *counts.entry(m.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.min_occurrences)
            .map(|(word, _)| word.to_string())
            .collect()
    }

    fn accept(&self, word: &str, terms: &mut BTreeSet<String>) {
        if word.chars().count() >= self.config.min_length && !self.excluded.contains(word) {
            terms.insert(word.to_string());
        }
    }
}

impl Default for TermExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// Extract candidate terms with the default configuration
pub fn extract_candidate_terms(text: &str) -> BTreeSet<String> {
    TermExtractor::default().extract(text)
}
