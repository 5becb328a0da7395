/*!
 * Prompt construction for LLM backends.
 *
 * The system prompt carries the translation rules, the glossary for the
 * request and, for batched requests, the unit-marker instructions. The user
 * prompt carries the encoded payload.
 */

use crate::glossary::GlossarySubset;
use crate::language_utils;

use super::wire;

/// System prompt template with `{source_language}` and `{target_language}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub const DOCUMENT_TRANSLATOR: &'static str = r#"You are a professional translator from {source_language} to {target_language}. Follow these rules:
1. Translate sentence by sentence without adding, omitting or summarizing anything
2. Keep the paragraph structure and line breaks of the original
3. Use the glossary translations for the listed terms exactly
4. Output only the translation, with no explanations or notes
5. Keep all symbols and markup unchanged"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template, naming languages by their English names when known
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        let source = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        self.template
            .replace("{source_language}", &source)
            .replace("{target_language}", &target)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(Self::DOCUMENT_TRANSLATOR)
    }
}

/// A rendered system/user prompt pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationPrompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt pair for one request
pub fn build_prompt(
    template: &PromptTemplate,
    source_language: &str,
    target_language: &str,
    texts: &[String],
    glossary: &GlossarySubset,
) -> TranslationPrompt {
    let mut system = template.render(source_language, target_language);

    if !glossary.is_empty() {
        system.push_str("\n\nAlways translate these terms as given:\n");
        for entry in glossary.entries() {
            system.push_str(&format!("- {} → {}\n", entry.term, entry.translation));
        }
    }

    if texts.len() > 1 {
        system.push_str(&format!(
            "\n\nThe input contains {} units, each introduced by a marker such as {}. \
             Reproduce every marker unchanged on its own line followed by that unit's translation, \
             never merge or split units, and finish with {}.",
            texts.len(),
            wire::unit_marker(0),
            wire::END_MARKER
        ));
    }

    TranslationPrompt {
        system,
        user: wire::encode_units(texts),
    }
}
