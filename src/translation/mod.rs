/*!
 * Translation of structural units through an LLM backend.
 *
 * - `orchestrator`: chunking, retries, fallback and ordered joining
 * - `chunking`: partitioning of units into request-sized chunks
 * - `wire`: unit-separator contract for batched requests
 * - `prompts`: system and user prompt construction
 * - `cache`: single-flight deduplication of identical requests
 * - `result`: per-unit outcomes
 * - `report`: request statistics and the run report
 */

pub mod cache;
pub mod chunking;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod result;
pub mod wire;

pub use self::chunking::{Chunk, ChunkLimit, partition_units};
pub use self::orchestrator::{Orchestrator, ProgressCallback};
pub use self::prompts::{PromptTemplate, TranslationPrompt};
pub use self::report::{RequestStatsSnapshot, RunReport};
pub use self::result::{TranslationResult, TranslationStatus};
