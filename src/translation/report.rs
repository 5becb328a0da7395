/*!
 * Run statistics and the end-of-run report.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::result::{TranslationResult, TranslationStatus};

/// Request counters shared by all chunk tasks of a run
#[derive(Debug, Default)]
pub struct RequestStats {
    chunk_requests: AtomicUsize,
    unit_requests: AtomicUsize,
    retries: AtomicUsize,
    mismatches: AtomicUsize,
    deduplicated: AtomicUsize,
}

impl RequestStats {
    pub fn record_chunk_request(&self) {
        self.chunk_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unit_request(&self) {
        self.unit_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mismatch(&self) {
        self.mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_deduplicated(&self, count: usize) {
        self.deduplicated.store(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        RequestStatsSnapshot {
            chunk_requests: self.chunk_requests.load(Ordering::Relaxed),
            unit_requests: self.unit_requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            mismatches: self.mismatches.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `RequestStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStatsSnapshot {
    /// Batched requests issued, excluding retries
    pub chunk_requests: usize,
    /// Single-unit fallback requests issued, excluding retries
    pub unit_requests: usize,
    pub retries: usize,
    /// Chunks whose response could not be mapped back onto their units
    pub mismatches: usize,
    /// Requests answered by an identical earlier request
    pub deduplicated: usize,
}

/// Summary of one translation run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total_units: usize,
    pub translated: usize,
    pub fallback: usize,
    pub passthrough: usize,
    pub fallback_ids: Vec<String>,
    pub requests: RequestStatsSnapshot,
    pub elapsed: Duration,
    /// Set when the run aborted
    pub abort_reason: Option<String>,
}

impl RunReport {
    /// Build a report from the results of a completed run
    pub fn from_results(results: &[TranslationResult], requests: RequestStatsSnapshot, elapsed: Duration) -> Self {
        let mut report = Self {
            total_units: results.len(),
            requests,
            elapsed,
            ..Self::default()
        };

        for result in results {
            match result.status {
                TranslationStatus::Ok => report.translated += 1,
                TranslationStatus::FallbackOriginal | TranslationStatus::Failed => {
                    report.fallback += 1;
                    report.fallback_ids.push(result.unit_id.clone());
                }
                TranslationStatus::Passthrough => report.passthrough += 1,
            }
        }

        report
    }

    /// Report for a run that did not complete
    pub fn aborted(total_units: usize, requests: RequestStatsSnapshot, elapsed: Duration, reason: &str) -> Self {
        Self {
            total_units,
            requests,
            elapsed,
            abort_reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.abort_reason.is_none()
    }

    /// Multi-line human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.abort_reason {
            Some(reason) => lines.push(format!("Run aborted: {}", reason)),
            None => lines.push(format!(
                "Translated {} of {} units ({} kept original, {} passed through) in {:.1}s",
                self.translated,
                self.total_units,
                self.fallback,
                self.passthrough,
                self.elapsed.as_secs_f64()
            )),
        }

        lines.push(format!(
            "Requests: {} chunk, {} single-unit, {} retries, {} mismatched, {} deduplicated",
            self.requests.chunk_requests,
            self.requests.unit_requests,
            self.requests.retries,
            self.requests.mismatches,
            self.requests.deduplicated
        ));

        if !self.fallback_ids.is_empty() {
            lines.push(format!("Units kept in the original language: {}", self.fallback_ids.join(", ")));
        }

        lines.join("\n")
    }
}
