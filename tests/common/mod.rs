/*!
 * Common test utilities for the doctrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use doctrans::app_config::{Config, OrchestrationConfig};
use doctrans::document::{FormatAttributes, StructuralUnit};

/// Route library logs through env_logger; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Text units `p1..pN` with a distinct style per unit
pub fn text_units(texts: &[&str]) -> Vec<StructuralUnit> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            StructuralUnit::text(
                format!("p{}", i + 1),
                i,
                *text,
                FormatAttributes::styled(&format!("Body {}", i + 1)),
            )
        })
        .collect()
}

/// Orchestration settings with millisecond backoff so retry tests stay fast
pub fn fast_orchestration(max_chunk_size: usize) -> OrchestrationConfig {
    OrchestrationConfig {
        max_chunk_size,
        max_retries: 3,
        retry_backoff_ms: 1,
        max_backoff_ms: 5,
        ..OrchestrationConfig::default()
    }
}

/// A config whose permanent dictionary lives in `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.dictionary.permanent_path = dir.join("permanent_dict.json");
    config.orchestration = fast_orchestration(config.orchestration.max_chunk_size);
    config
}

/// A sample Japanese document with a figure placeholder
pub fn create_sample_document(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = "日本語のテストです。\n\n\
                   [[figure-1]]\n\n\
                   プログラムは東京で動きます。\n\n\
                   テストは明日も続きます。\n";
    create_test_file(dir, filename, content)
}
