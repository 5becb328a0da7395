/*!
 * Tests for the provider adapter and backend construction
 */

use async_trait::async_trait;
use parking_lot::Mutex;

use doctrans::app_config::{Config, TranslationProvider};
use doctrans::errors::{BackendError, ProviderError};
use doctrans::glossary::{DictionaryEntry, GlossarySubset};
use doctrans::providers::{LlmBackend, Provider, TranslationBackend, create_backend};
use doctrans::translation::prompts::{PromptTemplate, TranslationPrompt};

/// Provider that answers every prompt with a fixed reply or error
#[derive(Debug)]
struct ScriptedProvider {
    reply: Result<String, String>,
    prompts: Mutex<Vec<TranslationPrompt>>,
}

impl ScriptedProvider {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing_with_status(status: u16) -> Self {
        Self {
            reply: Err(status.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    type Request = TranslationPrompt;
    type Response = String;

    fn build_request(&self, prompt: &TranslationPrompt) -> Self::Request {
        prompt.clone()
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.prompts.lock().push(request);
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => Err(ProviderError::ApiError {
                status_code: status.parse().unwrap_or(500),
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.clone()
    }
}

fn backend(provider: ScriptedProvider) -> LlmBackend<ScriptedProvider> {
    LlmBackend::new("Scripted", provider, PromptTemplate::default(), "ja", "zh")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Test that a framed response is split back into units
#[tokio::test]
async fn test_translateBatch_withFramedResponse_shouldDecodeUnits() {
    let backend = backend(ScriptedProvider::replying(
        "Here you go:\n<<UNIT_0>>\n你好\n<<UNIT_1>>\n世界\n<<END>>",
    ));

    let result = backend
        .translate_batch(&strings(&["こんにちは", "世界"]), &GlossarySubset::default())
        .await
        .unwrap();

    assert_eq!(result, strings(&["你好", "世界"]));
}

/// Test that a response missing unit markers is classified as malformed
#[tokio::test]
async fn test_translateBatch_withMergedResponse_shouldBeMalformed() {
    let backend = backend(ScriptedProvider::replying("你好世界"));

    let result = backend
        .translate_batch(&strings(&["こんにちは", "世界"]), &GlossarySubset::default())
        .await;

    assert!(matches!(result, Err(BackendError::Malformed(_))));
}

/// Test that the prompt carries the glossary subset and the bare single text
#[tokio::test]
async fn test_translateBatch_withSingleUnit_shouldSendBareTextAndGlossary() {
    let backend = backend(ScriptedProvider::replying("  东京很大  "));
    let glossary = GlossarySubset::new(vec![DictionaryEntry::new("東京", "东京")]);

    let result = backend
        .translate_batch(&strings(&["東京は大きい"]), &glossary)
        .await
        .unwrap();
    assert_eq!(result, strings(&["东京很大"]));

    let prompts = backend.provider().prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].user, "東京は大きい");
    assert!(prompts[0].system.contains("- 東京 → 东京"));
    assert!(prompts[0].system.contains("Japanese"));
}

/// Test that HTTP failures map onto retry classes
#[tokio::test]
async fn test_translateBatch_withHttpFailures_shouldClassifyErrors() {
    let server_error = backend(ScriptedProvider::failing_with_status(503))
        .translate_batch(&strings(&["一"]), &GlossarySubset::default())
        .await;
    let client_error = backend(ScriptedProvider::failing_with_status(400))
        .translate_batch(&strings(&["一"]), &GlossarySubset::default())
        .await;

    assert!(matches!(server_error, Err(BackendError::Transient(_))));
    assert!(matches!(client_error, Err(BackendError::Fatal(_))));
}

/// Test that hosted providers are built from the configuration
#[test]
fn test_createBackend_forDeepSeek_shouldNameProvider() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::DeepSeek;
    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();

    let backend = create_backend(&config).unwrap();
    assert_eq!(backend.name(), "DeepSeek");
}
