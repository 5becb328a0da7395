/*!
 * Translation orchestration.
 *
 * The orchestrator turns an ordered list of structural units into an
 * index-aligned list of translation results:
 *
 * 1. Units needing translation are partitioned into chunks.
 * 2. Each chunk is sent as one request with the glossary subset for its text.
 * 3. A chunk whose response cannot be mapped back onto its units is retried
 *    unit by unit.
 * 4. Transient failures are retried with capped exponential backoff; fatal
 *    failures abort the run.
 * 5. A unit that never succeeds keeps its source text (fail-open) or aborts
 *    the run (fail-closed).
 * 6. Results are joined in input order and checked against the input.
 *
 * Chunks run concurrently; a shared semaphore bounds the number of backend
 * calls in flight. Placeholder and blank units never reach the backend.
 */

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app_config::{DrainPolicy, FailurePolicy, OrchestrationConfig};
use crate::document::StructuralUnit;
use crate::errors::{BackendError, TranslationError};
use crate::glossary::{GlossarySubset, MergedGlossary};
use crate::providers::TranslationBackend;

use super::cache::RequestCache;
use super::chunking::{Chunk, partition_units};
use super::report::{RequestStats, RunReport};
use super::result::TranslationResult;

/// Progress callback: `(units_done, units_total)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Whether a request covers a whole chunk or a single unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Chunk,
    Unit,
}

/// Final outcome of a request after retries
#[derive(Debug)]
enum AttemptOutcome {
    Translated(Vec<String>),
    /// The response could not be mapped onto the chunk's units
    Mismatch(String),
    /// Retries were used up
    Exhausted(String),
    Fatal(String),
    Cancelled,
}

/// Drives translation of a document's units through a backend
pub struct Orchestrator {
    backend: Arc<dyn TranslationBackend>,
    config: OrchestrationConfig,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn TranslationBackend>, config: OrchestrationConfig) -> Self {
        Self {
            backend,
            config,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Cancel the run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Number of units that will be sent to the backend
    pub fn translatable_count(units: &[StructuralUnit]) -> usize {
        units.iter().filter(|u| u.needs_translation()).count()
    }

    /// Translate `units`; on error no partial results are returned
    pub async fn translate_units(
        &self,
        units: &[StructuralUnit],
        glossary: &MergedGlossary,
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        self.run(units, glossary).await.0
    }

    /// Translate `units` and report on the run
    pub async fn run(
        &self,
        units: &[StructuralUnit],
        glossary: &MergedGlossary,
    ) -> (Result<Vec<TranslationResult>, TranslationError>, RunReport) {
        let started = Instant::now();
        let stats = RequestStats::default();
        let cache = RequestCache::new(self.config.deduplicate_requests);
        let run_token = self.cancel.child_token();

        let outcome = self.execute(units, glossary, &stats, &cache, &run_token).await;

        stats.set_deduplicated(cache.hits());
        let report = match &outcome {
            Ok(results) => RunReport::from_results(results, stats.snapshot(), started.elapsed()),
            Err(e) => RunReport::aborted(units.len(), stats.snapshot(), started.elapsed(), &e.to_string()),
        };

        (outcome, report)
    }

    async fn execute(
        &self,
        units: &[StructuralUnit],
        glossary: &MergedGlossary,
        stats: &RequestStats,
        cache: &RequestCache,
        run_token: &CancellationToken,
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        let chunks = partition_units(units, self.config.max_chunk_size, self.config.chunk_limit);
        let total_units: usize = chunks.iter().map(Chunk::len).sum();
        info!(
            "Translating {} of {} units in {} chunk(s) with {}",
            total_units,
            units.len(),
            chunks.len(),
            self.backend.name()
        );

        let semaphore = Semaphore::new(self.config.concurrent_requests.max(1));
        let runner = ChunkRunner {
            backend: self.backend.as_ref(),
            config: &self.config,
            stats,
            cache,
            semaphore: &semaphore,
            token: run_token,
        };
        let runner = &runner;
        let completed = AtomicUsize::new(0);
        let completed = &completed;
        let progress = self.progress.as_ref();

        let work = stream::iter(chunks.iter())
            .map(|chunk| async move {
                let outcome = runner.translate_chunk(chunk, glossary).await;
                if outcome.is_ok() {
                    let done = completed.fetch_add(chunk.len(), Ordering::SeqCst) + chunk.len();
                    if let Some(callback) = progress {
                        callback(done, total_units);
                    }
                }
                outcome
            })
            .buffer_unordered(self.config.concurrent_requests.max(1))
            .collect::<Vec<_>>();

        let chunk_outcomes = match self.config.drain_policy {
            DrainPolicy::Drain => work.await,
            DrainPolicy::Abandon => {
                tokio::select! {
                    outcomes = work => outcomes,
                    _ = self.cancel.cancelled() => {
                        warn!("Translation cancelled, abandoning in-flight requests");
                        return Err(TranslationError::Cancelled);
                    }
                }
            }
        };

        let mut results: Vec<TranslationResult> = collect_outcomes(chunk_outcomes)
            .inspect_err(|e| error!("Translation run failed: {}", e))?
            .into_iter()
            .flatten()
            .collect();

        results.extend(
            units
                .iter()
                .filter(|u| !u.needs_translation())
                .map(TranslationResult::passthrough),
        );

        // Input position, not order_index: indices may repeat or arrive unsorted
        let positions: HashMap<&str, usize> = units
            .iter()
            .enumerate()
            .map(|(position, unit)| (unit.id(), position))
            .collect();
        results.sort_by_key(|r| positions.get(r.unit_id.as_str()).copied().unwrap_or(usize::MAX));
        verify_alignment(units, &results)?;
        Ok(results)
    }
}

/// Per-run state shared by every chunk task
struct ChunkRunner<'a> {
    backend: &'a dyn TranslationBackend,
    config: &'a OrchestrationConfig,
    stats: &'a RequestStats,
    cache: &'a RequestCache,
    semaphore: &'a Semaphore,
    token: &'a CancellationToken,
}

impl ChunkRunner<'_> {
    async fn translate_chunk(
        &self,
        chunk: &Chunk<'_>,
        glossary: &MergedGlossary,
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        let subset = glossary.subset_for(&chunk.joined_text());

        if chunk.len() > 1 {
            self.stats.record_chunk_request();
            let texts = chunk.texts();

            match self.call_with_retry(&texts, &subset, Granularity::Chunk).await {
                AttemptOutcome::Translated(translations) => {
                    debug!("Chunk {} translated ({} units)", chunk.index + 1, chunk.len());
                    return Ok(chunk
                        .units
                        .iter()
                        .zip(translations)
                        .map(|(unit, text)| TranslationResult::translated(unit, text))
                        .collect());
                }
                AttemptOutcome::Fatal(message) => return Err(self.fatal(message)),
                AttemptOutcome::Cancelled => return Err(TranslationError::Cancelled),
                AttemptOutcome::Mismatch(reason) => {
                    self.stats.record_mismatch();
                    warn!(
                        "Chunk {} response did not match its {} units ({}), retrying unit by unit",
                        chunk.index + 1,
                        chunk.len(),
                        reason
                    );
                }
                AttemptOutcome::Exhausted(reason) => {
                    warn!(
                        "Chunk {} failed after retries ({}), retrying unit by unit",
                        chunk.index + 1,
                        reason
                    );
                }
            }
        }

        let unit_outcomes = join_all(chunk.units.iter().map(|unit| self.translate_unit(unit, &subset))).await;
        collect_outcomes(unit_outcomes)
    }

    async fn translate_unit(
        &self,
        unit: &StructuralUnit,
        chunk_subset: &GlossarySubset,
    ) -> Result<TranslationResult, TranslationError> {
        let texts = vec![unit.source_text().to_string()];
        let subset = chunk_subset.restrict_to(unit.source_text());
        self.stats.record_unit_request();

        let reason = match self.call_with_retry(&texts, &subset, Granularity::Unit).await {
            AttemptOutcome::Translated(mut translations) => {
                return Ok(TranslationResult::translated(unit, translations.remove(0)));
            }
            AttemptOutcome::Fatal(message) => return Err(self.fatal(message)),
            AttemptOutcome::Cancelled => return Err(TranslationError::Cancelled),
            AttemptOutcome::Mismatch(reason) | AttemptOutcome::Exhausted(reason) => reason,
        };

        match self.config.failure_policy {
            FailurePolicy::FailOpen => {
                warn!("Keeping original text for unit {}: {}", unit.id(), reason);
                Ok(TranslationResult::fallback(unit))
            }
            FailurePolicy::FailClosed => {
                error!("Unit {} could not be translated: {}", unit.id(), reason);
                self.token.cancel();
                Err(TranslationError::UnitFailed {
                    unit_id: unit.id().to_string(),
                    reason,
                })
            }
        }
    }

    fn fatal(&self, message: String) -> TranslationError {
        error!("Backend {} failed fatally: {}", self.backend.name(), message);
        self.token.cancel();
        TranslationError::BackendFatal(message)
    }

    /// Issue one request, retrying transient failures.
    ///
    /// At chunk granularity a malformed response is final since the caller
    /// falls back to single units; at unit granularity it is retried.
    async fn call_with_retry(
        &self,
        texts: &[String],
        glossary: &GlossarySubset,
        granularity: Granularity,
    ) -> AttemptOutcome {
        let mut attempt: u32 = 0;

        loop {
            if self.token.is_cancelled() {
                return AttemptOutcome::Cancelled;
            }

            let result = {
                let Ok(_permit) = self.semaphore.acquire().await else {
                    return AttemptOutcome::Cancelled;
                };
                if self.token.is_cancelled() {
                    return AttemptOutcome::Cancelled;
                }
                self.cache
                    .get_or_call(texts, glossary, || self.call_backend(texts, glossary))
                    .await
            };

            let error = match result {
                Ok(translations) => return AttemptOutcome::Translated(translations),
                Err(BackendError::Fatal(message)) => return AttemptOutcome::Fatal(message),
                Err(BackendError::Malformed(message)) if granularity == Granularity::Chunk => {
                    return AttemptOutcome::Mismatch(message);
                }
                Err(error) => error,
            };

            if attempt >= self.config.max_retries {
                return AttemptOutcome::Exhausted(error.to_string());
            }
            attempt += 1;
            self.stats.record_retry();

            let delay = backoff_delay(attempt, self.config.retry_backoff_ms, self.config.max_backoff_ms);
            debug!(
                "Retrying {} unit(s) in {:?} (attempt {}/{}): {}",
                texts.len(),
                delay,
                attempt,
                self.config.max_retries,
                error
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.token.cancelled() => return AttemptOutcome::Cancelled,
            }
        }
    }

    /// One backend call whose response must cover every requested text with non-empty output
    async fn call_backend(&self, texts: &[String], glossary: &GlossarySubset) -> Result<Vec<String>, BackendError> {
        let translations = self.backend.translate_batch(texts, glossary).await?;
        if translations.len() != texts.len() {
            return Err(BackendError::Malformed(format!(
                "expected {} translations, got {}",
                texts.len(),
                translations.len()
            )));
        }
        if let Some(position) = translations
            .iter()
            .zip(texts)
            .position(|(translated, source)| translated.trim().is_empty() && !source.trim().is_empty())
        {
            return Err(BackendError::Malformed(format!(
                "translation {} of {} is empty",
                position + 1,
                texts.len()
            )));
        }
        Ok(translations)
    }
}

/// Exponential backoff with jitter: `base * 2^(attempt-1)`, capped at `max_ms`
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let delay = base_ms.saturating_mul(factor).min(max_ms);
    let jitter = if delay >= 4 {
        rand::rng().random_range(0..=delay / 4)
    } else {
        0
    };
    Duration::from_millis(delay.saturating_add(jitter).min(max_ms.max(delay)))
}

fn error_rank(error: &TranslationError) -> u8 {
    match error {
        TranslationError::BackendFatal(_) => 0,
        TranslationError::UnitFailed { .. } => 1,
        TranslationError::OrderingViolation(_) => 2,
        TranslationError::Cancelled => 3,
    }
}

/// Collect concurrent outcomes, reporting the most significant error if any failed
fn collect_outcomes<T>(
    outcomes: impl IntoIterator<Item = Result<T, TranslationError>>,
) -> Result<Vec<T>, TranslationError> {
    let mut values = Vec::new();
    let mut worst: Option<TranslationError> = None;

    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(e) => {
                if worst.as_ref().is_none_or(|w| error_rank(&e) < error_rank(w)) {
                    worst = Some(e);
                }
            }
        }
    }

    match worst {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Check that results line up one-to-one with the input units
fn verify_alignment(units: &[StructuralUnit], results: &[TranslationResult]) -> Result<(), TranslationError> {
    if units.len() != results.len() {
        return Err(TranslationError::OrderingViolation(format!(
            "{} units but {} results",
            units.len(),
            results.len()
        )));
    }

    for (index, (unit, result)) in units.iter().zip(results).enumerate() {
        if unit.id() != result.unit_id {
            return Err(TranslationError::OrderingViolation(format!(
                "result {} is for unit {} but unit {} is at that position",
                index,
                result.unit_id,
                unit.id()
            )));
        }
    }

    Ok(())
}
