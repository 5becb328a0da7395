use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::glossary::ExtractionConfig;
use crate::translation::chunking::ChunkLimit;
use crate::translation::prompts::PromptTemplate;

/// Application configuration module
/// This module handles loading, validating and saving the configuration.
/// The configuration is read once at startup and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation backend config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Chunking, retry and concurrency settings
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Term dictionaries
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Copy formatting attributes onto the output model
    #[serde(default = "default_true")]
    pub preserve_format: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI chat completions API
    OpenAI,
    /// DeepSeek, served through the OpenAI-compatible API
    DeepSeek,
}

impl TranslationProvider {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::DeepSeek => "DeepSeek",
        }
    }

    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::DeepSeek => "deepseek".to_string(),
        }
    }

    /// Hosted providers need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Settings for one backend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    #[serde(default = "String::new")]
    pub model: String,

    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ProviderConfig {
    pub fn new(provider: TranslationProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: default_model(provider),
            api_key: String::new(),
            endpoint: default_endpoint(provider),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

/// Translation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Settings shared by all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

/// What happens to a unit that still fails after every retry
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the source text and continue
    #[default]
    FailOpen,
    /// Abort the whole run
    FailClosed,
}

/// What happens to in-flight requests when a run is cancelled
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Let started requests finish, start nothing new
    #[default]
    Drain,
    /// Drop in-flight requests immediately
    Abandon,
}

/// Chunking, retry and concurrency settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrchestrationConfig {
    /// Maximum chunk size, measured per `chunk_limit`
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(default)]
    pub chunk_limit: ChunkLimit,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Maximum number of backend calls in flight
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub drain_policy: DrainPolicy,

    /// Share one backend call between identical requests
    #[serde(default = "default_true")]
    pub deduplicate_requests: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_limit: ChunkLimit::default(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            concurrent_requests: default_concurrent_requests(),
            failure_policy: FailurePolicy::default(),
            drain_policy: DrainPolicy::default(),
            deduplicate_requests: true,
        }
    }
}

/// Term dictionary settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DictionaryConfig {
    #[serde(default = "default_permanent_dict_path")]
    pub permanent_path: PathBuf,

    /// Temp dictionary; `<input stem>_temp_dict.json` beside the input when unset
    #[serde(default)]
    pub temp_path: Option<PathBuf>,

    /// Write candidate terms to the temp dictionary before translating
    #[serde(default)]
    pub extract_terms: bool,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            permanent_path: default_permanent_dict_path(),
            temp_path: None,
            extract_terms: false,
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_max_chunk_size() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationProvider::DeepSeek => "https://api.deepseek.com/v1".to_string(),
    }
}

fn default_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "qwen2.5".to_string(),
        TranslationProvider::OpenAI => "gpt-4".to_string(),
        TranslationProvider::DeepSeek => "deepseek-chat".to_string(),
    }
}

fn default_system_prompt() -> String {
    PromptTemplate::DOCUMENT_TRANSLATOR.to_string()
}

fn default_permanent_dict_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("doctrans")
        .join("permanent_dict.json")
}

impl Config {
    /// Load a configuration file, writing the defaults there first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.source_language)
            .context("Invalid source language")?;
        crate::language_utils::get_language_name(&self.target_language)
            .context("Invalid target language")?;

        if self.orchestration.max_chunk_size == 0 {
            return Err(anyhow!("orchestration.max_chunk_size must be at least 1"));
        }
        if self.orchestration.concurrent_requests == 0 {
            return Err(anyhow!("orchestration.concurrent_requests must be at least 1"));
        }

        let provider = self.translation.provider;
        if provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                provider.display_name()
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            orchestration: OrchestrationConfig::default(),
            dictionary: DictionaryConfig::default(),
            preserve_format: true,
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(self.provider)
    }

    pub fn get_provider_config(&self, provider: TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model(self.provider))
    }

    /// API key from the config, else from `<PROVIDER>_API_KEY` in the environment
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| {
                let var = format!("{}_API_KEY", self.provider.to_lowercase_string().to_uppercase());
                std::env::var(var).ok().filter(|k| !k.is_empty())
            })
            .unwrap_or_default()
    }

    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(self.provider))
    }

    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    pub fn get_temperature(&self) -> f32 {
        self.get_active_provider_config()
            .map(|p| p.temperature)
            .unwrap_or_else(default_temperature)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::DeepSeek),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
