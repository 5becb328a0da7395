use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and path utilities

/// Suffix appended to the input stem for the translated document
const TRANSLATED_SUFFIX: &str = "_translated";

/// Suffix appended to the input stem for the per-document temp dictionary
const TEMP_DICT_SUFFIX: &str = "_temp_dict.json";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// `<stem>_translated.<ext>` beside the input
    pub fn output_path_for<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let mut file_name = Self::stem_of(input_file);
        file_name.push_str(TRANSLATED_SUFFIX);
        if let Some(ext) = input_file.extension() {
            file_name.push('.');
            file_name.push_str(&ext.to_string_lossy());
        }
        input_file.with_file_name(file_name)
    }

    /// `<stem>_temp_dict.json` beside the input
    pub fn temp_dict_path_for<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let mut file_name = Self::stem_of(input_file);
        file_name.push_str(TEMP_DICT_SUFFIX);
        input_file.with_file_name(file_name)
    }

    /// Fail when `output` exists and overwriting was not requested
    pub fn check_overwrite<P: AsRef<Path>>(output: P, force_overwrite: bool) -> Result<()> {
        let output = output.as_ref();
        if output.exists() && !force_overwrite {
            return Err(anyhow!(
                "Output file already exists: {:?} (use --force-overwrite to replace it)",
                output
            ));
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    fn stem_of(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    }
}
