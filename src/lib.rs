/*!
 * # doctrans - Dictionary-constrained document translation
 *
 * A Rust library for translating structured documents unit by unit with LLM
 * backends while keeping terminology consistent and formatting intact.
 *
 * ## Features
 *
 * - Permanent and per-document term dictionaries, merged once per run
 * - Candidate term extraction for reviewing a document's terminology
 * - Batched translation with a strict 1:1 unit correspondence:
 *   - mismatched batches fall back to single-unit requests
 *   - transient failures are retried with exponential backoff
 *   - fail-open or fail-closed handling of units that never succeed
 * - Translation through various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - DeepSeek API
 * - Reconstruction of the output model with the source formatting
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Structural units, the output model and document I/O
 * - `glossary`: Dictionary store, merged glossary and term extraction
 * - `translation`: Orchestration of translation requests:
 *   - `translation::orchestrator`: chunking, retries, fallback and ordering
 *   - `translation::wire`: unit-separator contract for batched requests
 *   - `translation::cache`: single-flight request deduplication
 * - `reconstruction`: Pairing translated text with source formatting
 * - `providers`: Translation backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scriptable backend for tests and dry runs
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod glossary;
pub mod language_utils;
pub mod providers;
pub mod reconstruction;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, TranslateOptions};
pub use document::{OutputDocumentModel, StructuralUnit};
pub use errors::{AppError, BackendError, DictionaryError, ReconstructionError, TranslationError};
pub use glossary::{DictionaryScope, GlossaryStore, MergedGlossary};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::TranslationBackend;
pub use reconstruction::FormatReconstructor;
pub use translation::{Orchestrator, RunReport, TranslationResult, TranslationStatus};
