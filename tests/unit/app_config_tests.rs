/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::fs;

use doctrans::app_config::{Config, DrainPolicy, TranslationProvider};

use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "zh");
    let written: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written.orchestration.max_chunk_size, config.orchestration.max_chunk_size);
    Ok(())
}

/// Test that an existing config file is read and missing sections default
#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "fr",
            "translation": {
                "provider": "deepseek",
                "available_providers": [
                    {"type": "deepseek", "model": "deepseek-reasoner", "api_key": "sk-test"}
                ]
            },
            "orchestration": {"drain_policy": "abandon", "concurrent_requests": 2},
            "dictionary": {"extraction": {"min_term_length": 3}}
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.provider, TranslationProvider::DeepSeek);
    assert_eq!(config.translation.get_model(), "deepseek-reasoner");
    assert_eq!(config.translation.get_endpoint(), "https://api.deepseek.com/v1");
    assert_eq!(config.orchestration.drain_policy, DrainPolicy::Abandon);
    assert_eq!(config.orchestration.concurrent_requests, 2);
    assert_eq!(config.dictionary.extraction.min_length, 3);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that a broken config file is reported rather than replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test that zero concurrency is rejected
#[test]
fn test_validate_withZeroConcurrency_shouldFail() {
    let mut config = Config::default();
    config.orchestration.concurrent_requests = 0;
    assert!(config.validate().is_err());
}
