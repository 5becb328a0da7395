/*!
 * OpenAI-compatible chat completions client.
 *
 * Used for OpenAI itself and for DeepSeek, which serves the same API under
 * its own endpoint.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::error;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::translation::prompts::TranslationPrompt;

use super::{Provider, classify_request_error, classify_status};

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug)]
pub struct OpenAI {
    completions_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl OpenAI {
    /// Create a client; `endpoint` is the API base such as `https://api.openai.com/v1`
    pub fn new(
        endpoint: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.as_ref().trim_end_matches('/');
        let completions_url = Url::parse(&format!("{}/chat/completions", endpoint))
            .with_context(|| format!("Invalid API endpoint: {}", endpoint))?;

        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            completions_url,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            client,
        })
    }

    pub fn completions_url(&self) -> &Url {
        &self.completions_url
    }

    /// Send one chat completion request; no retries
    pub async fn chat(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ProviderError> {
        let response = self
            .client
            .post(self.completions_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Chat completions API error ({}): {}", status, error_text);
            return Err(classify_status(status, error_text));
        }

        let body = response.text().await.map_err(classify_request_error)?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(format!("Invalid chat completion response: {}", e)))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    fn build_request(&self, prompt: &TranslationPrompt) -> Self::Request {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", prompt.system.clone()),
                ChatMessage::new("user", prompt.user.clone()),
            ],
            temperature: self.temperature,
            stream: false,
        }
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self.chat(&request).await?;
        if response.choices.is_empty() {
            return Err(ProviderError::ParseError("response has no choices".to_string()));
        }
        Ok(response)
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default()
    }
}
