/*!
 * Translation backends.
 *
 * `TranslationBackend` is the seam the orchestrator talks to: one call takes
 * an ordered list of texts plus the glossary subset for them and returns one
 * translation per text, or a classified `BackendError`.
 *
 * LLM clients implement the lower-level `Provider` trait and are adapted to
 * `TranslationBackend` by `LlmBackend`, which owns prompt construction and the
 * unit-separator wire contract:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI chat completions API, also used for DeepSeek
 * - Mock: Scriptable backend for tests and dry runs
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::{BackendError, ProviderError};
use crate::glossary::GlossarySubset;
use crate::translation::prompts::{self, PromptTemplate, TranslationPrompt};
use crate::translation::wire;

pub mod mock;
pub mod ollama;
pub mod openai;

/// A translation service the orchestrator can call.
///
/// Implementations make exactly one attempt per call; retrying is the caller's job.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Translate `texts` in order, honoring `glossary`.
    ///
    /// On success the result has exactly one entry per input text.
    async fn translate_batch(
        &self,
        texts: &[String],
        glossary: &GlossarySubset,
    ) -> Result<Vec<String>, BackendError>;
}

/// Common trait for LLM completion clients
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Turn a rendered prompt into a provider request
    fn build_request(&self, prompt: &TranslationPrompt) -> Self::Request;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract the generated text from a response
    fn extract_text(response: &Self::Response) -> String;
}

/// Adapts a completion `Provider` to `TranslationBackend`
#[derive(Debug)]
pub struct LlmBackend<P: Provider> {
    name: String,
    provider: P,
    template: PromptTemplate,
    source_language: String,
    target_language: String,
}

impl<P: Provider> LlmBackend<P> {
    pub fn new(
        name: impl Into<String>,
        provider: P,
        template: PromptTemplate,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            template,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: Provider> TranslationBackend for LlmBackend<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        glossary: &GlossarySubset,
    ) -> Result<Vec<String>, BackendError> {
        let prompt = prompts::build_prompt(
            &self.template,
            &self.source_language,
            &self.target_language,
            texts,
            glossary,
        );
        let request = self.provider.build_request(&prompt);
        let response = self.provider.complete(request).await?;
        let raw = P::extract_text(&response);

        debug!("{} returned {} chars for {} unit(s)", self.name, raw.chars().count(), texts.len());
        wire::decode_units(&raw, texts.len())
    }
}

/// Build the backend selected by the configuration
pub fn create_backend(config: &Config) -> Result<Arc<dyn TranslationBackend>> {
    let translation = &config.translation;
    let template = PromptTemplate::new(&translation.common.system_prompt);
    let timeout = Duration::from_secs(translation.get_timeout_secs());
    let provider = translation.provider;

    let backend: Arc<dyn TranslationBackend> = match provider {
        TranslationProvider::Ollama => {
            let client = ollama::Ollama::from_url(
                translation.get_endpoint(),
                translation.get_model(),
                translation.get_temperature(),
                timeout,
            )?;
            Arc::new(LlmBackend::new(
                provider.display_name(),
                client,
                template,
                &config.source_language,
                &config.target_language,
            ))
        }
        TranslationProvider::OpenAI | TranslationProvider::DeepSeek => {
            let client = openai::OpenAI::new(
                translation.get_endpoint(),
                translation.get_api_key(),
                translation.get_model(),
                translation.get_temperature(),
                timeout,
            )?;
            Arc::new(LlmBackend::new(
                provider.display_name(),
                client,
                template,
                &config.source_language,
                &config.target_language,
            ))
        }
    };

    Ok(backend)
}

/// Map a transport failure onto `ProviderError`
pub(crate) fn classify_request_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status onto `ProviderError`
pub(crate) fn classify_status(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}
