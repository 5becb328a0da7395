/*!
 * Mock backend for tests and dry runs.
 *
 * The mock simulates the failure modes the orchestrator must handle:
 * - `MockBackend::working()` - Always succeeds, applying the glossary
 * - `MockBackend::merging()` - Returns one text for a multi-unit request
 * - `MockBehavior::BlankingBatches` - Drops the text of one unit in a batch
 * - `MockBackend::transient_then_success(n)` - Fails transiently `n` times
 * - `MockBackend::failing()` - Always fails transiently
 * - `MockBackend::fatal()` - Fails with an unrecoverable error
 *
 * Every request is recorded so tests can inspect what was sent, and the
 * peak number of concurrent calls is tracked.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::BackendError;
use crate::glossary::GlossarySubset;

use super::TranslationBackend;

/// Prefix the mock puts in front of every translation
pub const MOCK_PREFIX: &str = "[译] ";

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Multi-unit requests come back as a single merged text
    Merging,
    /// Multi-unit requests fail as malformed; single units succeed
    MalformedBatches,
    /// Every request is malformed
    AlwaysMalformed,
    /// Multi-unit requests come back with the last unit blank
    BlankingBatches,
    /// The first `failures` requests fail transiently
    TransientThenSuccess { failures: usize },
    /// Every request fails transiently
    AlwaysTransient,
    /// Every request fails fatally
    Fatal,
    /// Requests containing `needle` fail transiently; others succeed
    FailOn { needle: String },
    /// Succeeds after a fixed delay
    Slow { delay_ms: u64 },
    /// Succeeds after a random delay up to `max_ms`
    RandomDelay { max_ms: u64 },
}

/// Scriptable `TranslationBackend`
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn merging() -> Self {
        Self::new(MockBehavior::Merging)
    }

    pub fn transient_then_success(failures: usize) -> Self {
        Self::new(MockBehavior::TransientThenSuccess { failures })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::AlwaysTransient)
    }

    pub fn fatal() -> Self {
        Self::new(MockBehavior::Fatal)
    }

    pub fn fail_on(needle: &str) -> Self {
        Self::new(MockBehavior::FailOn {
            needle: needle.to_string(),
        })
    }

    /// The translation the mock produces for `text`
    pub fn mock_translation(text: &str, glossary: &GlossarySubset) -> String {
        let mut translated = text.to_string();
        for entry in glossary.entries() {
            translated = translated.replace(&entry.term, &entry.translation);
        }
        format!("{}{}", MOCK_PREFIX, translated)
    }

    /// Number of calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts of every call in arrival order
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().clone()
    }

    /// Every text that was ever sent
    pub fn sent_texts(&self) -> Vec<String> {
        self.requests.lock().iter().flatten().cloned().collect()
    }

    /// Highest number of simultaneous calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn translate_all(texts: &[String], glossary: &GlossarySubset) -> Vec<String> {
        texts.iter().map(|t| Self::mock_translation(t, glossary)).collect()
    }

    async fn respond(
        &self,
        count: usize,
        texts: &[String],
        glossary: &GlossarySubset,
    ) -> Result<Vec<String>, BackendError> {
        match &self.behavior {
            MockBehavior::Working => Ok(Self::translate_all(texts, glossary)),

            MockBehavior::Merging => {
                let merged = Self::translate_all(texts, glossary).join(" ");
                Ok(vec![merged])
            }

            MockBehavior::MalformedBatches if texts.len() > 1 => Err(BackendError::Malformed(
                "Simulated missing unit markers".to_string(),
            )),
            MockBehavior::MalformedBatches => Ok(Self::translate_all(texts, glossary)),

            MockBehavior::BlankingBatches if texts.len() > 1 => {
                let mut translations = Self::translate_all(texts, glossary);
                if let Some(last) = translations.last_mut() {
                    last.clear();
                }
                Ok(translations)
            }
            MockBehavior::BlankingBatches => Ok(Self::translate_all(texts, glossary)),

            MockBehavior::AlwaysMalformed => {
                Err(BackendError::Malformed("Simulated malformed response".to_string()))
            }

            MockBehavior::TransientThenSuccess { failures } if count < *failures => Err(
                BackendError::Transient(format!("Simulated timeout (request #{})", count + 1)),
            ),
            MockBehavior::TransientThenSuccess { .. } => Ok(Self::translate_all(texts, glossary)),

            MockBehavior::AlwaysTransient => Err(BackendError::Transient(
                "Simulated provider failure".to_string(),
            )),

            MockBehavior::Fatal => Err(BackendError::Fatal("Simulated invalid API key".to_string())),

            MockBehavior::FailOn { needle } if texts.iter().any(|t| t.contains(needle.as_str())) => {
                Err(BackendError::Transient(format!("Simulated failure on '{}'", needle)))
            }
            MockBehavior::FailOn { .. } => Ok(Self::translate_all(texts, glossary)),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(Self::translate_all(texts, glossary))
            }

            MockBehavior::RandomDelay { max_ms } => {
                let delay = rand::rng().random_range(0..=*max_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(Self::translate_all(texts, glossary))
            }
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        glossary: &GlossarySubset,
    ) -> Result<Vec<String>, BackendError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(texts.to_vec());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = self.respond(count, texts, glossary).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
