/*!
 * Request deduplication for a translation run.
 *
 * Identical requests (same texts, same glossary subset) share one backend
 * call: the first caller performs it while concurrent callers wait for its
 * outcome. Successful responses are reused for the rest of the run. Failed
 * calls are not remembered, so a waiting caller performs its own attempt.
 */

use log::debug;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::OnceCell;

use crate::glossary::GlossarySubset;

/// Single-flight cache of backend responses keyed by request signature
#[derive(Debug, Clone)]
pub struct RequestCache {
    entries: Arc<Mutex<HashMap<String, Arc<OnceCell<Vec<String>>>>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    enabled: bool,
}

impl RequestCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stable signature of a request
    pub fn signature(texts: &[String], glossary: &GlossarySubset) -> String {
        let mut hasher = Sha256::new();
        for text in texts {
            hasher.update(text.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for entry in glossary.entries() {
            hasher.update(entry.term.as_bytes());
            hasher.update([0x1f]);
            hasher.update(entry.translation.as_bytes());
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Return the shared response for this request, running `call` if no
    /// response is stored or in flight
    pub async fn get_or_call<F, Fut, E>(
        &self,
        texts: &[String],
        glossary: &GlossarySubset,
        call: F,
    ) -> Result<Vec<String>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, E>>,
    {
        if !self.enabled {
            return call().await;
        }

        let key = Self::signature(texts, glossary);
        let cell = {
            let mut entries = self.entries.lock();
            entries.entry(key).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };

        let ran = AtomicBool::new(false);
        let result = cell
            .get_or_try_init(|| async {
                ran.store(true, Ordering::Relaxed);
                call().await
            })
            .await
            .cloned();

        if ran.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else if result.is_ok() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Reused response for {} identical unit(s)", texts.len());
        }

        result
    }

    /// Number of requests answered without a backend call
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of requests that performed a backend call
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(true)
    }
}
