use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::document::{DocumentFormat, StructuralUnit, read_document, write_document};
use crate::file_utils::FileManager;
use crate::glossary::{DictionaryScope, GlossaryStore, TermExtractor};
use crate::language_utils;
use crate::providers::mock::MockBackend;
use crate::providers::{self, TranslationBackend};
use crate::reconstruction::FormatReconstructor;
use crate::translation::{Orchestrator, ProgressCallback, RunReport};

// @module: Application controller for document translation

/// Options for one `translate` invocation
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub input: PathBuf,
    /// `<stem>_translated.<ext>` beside the input when unset
    pub output: Option<PathBuf>,
    pub force_overwrite: bool,
    /// Use the mock backend instead of a real provider
    pub dry_run: bool,
}

impl TranslateOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| FileManager::output_path_for(&self.input))
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Cancels the current run when triggered
    cancel: CancellationToken,
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
            show_progress: true,
        })
    }

    /// Create a controller with default configuration and no progress bar
    pub fn new_for_test() -> Result<Self> {
        let mut controller = Self::with_config(Config::default())?;
        controller.show_progress = false;
        Ok(controller)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that cancels runs started by this controller
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Temp dictionary for `input`: the configured path, else one beside the input
    pub fn temp_dict_path(&self, input: &Path) -> PathBuf {
        self.config
            .dictionary
            .temp_path
            .clone()
            .unwrap_or_else(|| FileManager::temp_dict_path_for(input))
    }

    /// Load the permanent dictionary and, when given, a temp dictionary
    pub fn load_glossary(&self, temp_path: Option<&Path>) -> Result<GlossaryStore> {
        let permanent_path = &self.config.dictionary.permanent_path;
        GlossaryStore::load(permanent_path, temp_path).with_context(|| {
            format!(
                "Failed to load dictionaries (permanent: {:?}, temp: {:?})",
                permanent_path, temp_path
            )
        })
    }

    /// Translate one document with the configured backend
    pub async fn run(&self, options: &TranslateOptions) -> Result<RunReport> {
        let backend: Arc<dyn TranslationBackend> = if options.dry_run {
            info!("Dry run: using the mock backend");
            Arc::new(MockBackend::working())
        } else {
            providers::create_backend(&self.config)?
        };
        self.run_with_backend(options, backend).await
    }

    /// Translate one document with an explicit backend
    pub async fn run_with_backend(
        &self,
        options: &TranslateOptions,
        backend: Arc<dyn TranslationBackend>,
    ) -> Result<RunReport> {
        let input = &options.input;
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        let output = options.output_path();
        FileManager::check_overwrite(&output, options.force_overwrite)?;
        let input_format = DocumentFormat::from_path(input)?;
        let output_format = DocumentFormat::from_path(&output)?;

        let units = read_document(input, input_format)
            .with_context(|| format!("Failed to read document: {:?}", input))?;
        info!("Read {} units from {:?}", units.len(), input);
        self.check_source_language(&units);

        let temp_path = self.temp_dict_path(input);
        if self.config.dictionary.extract_terms {
            self.write_term_template(&units, &temp_path)?;
        }
        let glossary = self.load_glossary(Some(&temp_path))?.merge();
        debug!("Merged glossary has {} terms", glossary.len());

        let progress_bar = self.progress_bar(Orchestrator::translatable_count(&units));
        let mut orchestrator = Orchestrator::new(backend, self.config.orchestration.clone())
            .with_cancellation(self.cancel.clone());
        if let Some(bar) = &progress_bar {
            let bar = bar.clone();
            let callback: ProgressCallback = Arc::new(move |done, _total| bar.set_position(done as u64));
            orchestrator = orchestrator.with_progress(callback);
        }

        let (outcome, report) = orchestrator.run(&units, &glossary).await;
        if let Some(bar) = progress_bar {
            bar.finish_and_clear();
        }

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                error!("{}", report.summary());
                return Err(anyhow!(e).context(format!("Translation of {:?} failed", input)));
            }
        };

        let model = FormatReconstructor::new(self.config.preserve_format)
            .reconstruct(&units, &results)
            .context("Failed to rebuild the output document")?;

        if let Some(parent) = output.parent() {
            FileManager::ensure_dir(parent)?;
        }
        write_document(&model, &output, output_format)
            .with_context(|| format!("Failed to write document: {:?}", output))?;

        for line in report.summary().lines() {
            info!("{}", line);
        }
        info!("Success: {:?}", output);
        Ok(report)
    }

    /// Extract candidate terms from `input` into its temp dictionary template
    pub fn extract_terms(&self, input: &Path) -> Result<(PathBuf, usize)> {
        let format = DocumentFormat::from_path(input)?;
        let units = read_document(input, format)
            .with_context(|| format!("Failed to read document: {:?}", input))?;
        let temp_path = self.temp_dict_path(input);
        let count = self.write_term_template(&units, &temp_path)?;
        Ok((temp_path, count))
    }

    /// Add a term; returns whether the dictionary changed
    pub fn dict_add(
        &self,
        scope: DictionaryScope,
        temp_path: Option<&Path>,
        term: &str,
        translation: &str,
    ) -> Result<bool> {
        let mut store = self.load_glossary(temp_path)?;
        let changed = store.add(scope, term, translation)?;
        if changed {
            store.save(scope)?;
        }
        Ok(changed)
    }

    /// Remove a term; returns whether the dictionary changed
    pub fn dict_remove(&self, scope: DictionaryScope, temp_path: Option<&Path>, term: &str) -> Result<bool> {
        let mut store = self.load_glossary(temp_path)?;
        let changed = store.remove(scope, term);
        if changed {
            store.save(scope)?;
        }
        Ok(changed)
    }

    pub fn dict_list(&self, scope: DictionaryScope, temp_path: Option<&Path>) -> Result<Vec<(String, String)>> {
        let store = self.load_glossary(temp_path)?;
        Ok(store
            .entries(scope)
            .iter()
            .map(|(term, translation)| (term.clone(), translation.clone()))
            .collect())
    }

    pub fn dict_clear(&self, scope: DictionaryScope, temp_path: Option<&Path>) -> Result<()> {
        let mut store = self.load_glossary(temp_path)?;
        store.clear(scope);
        store.save(scope)?;
        Ok(())
    }

    fn write_term_template(&self, units: &[StructuralUnit], temp_path: &Path) -> Result<usize> {
        let text = joined_text(units);
        let terms = TermExtractor::new(self.config.dictionary.extraction.clone()).extract(&text);
        let store = self.load_glossary(None)?;
        let count = store
            .materialize_temp_template(temp_path, &terms)
            .with_context(|| format!("Failed to write term template: {:?}", temp_path))?;
        info!(
            "Found {} candidate terms, {} entries in temp dictionary {:?}",
            terms.len(),
            count,
            temp_path
        );
        Ok(count)
    }

    fn check_source_language(&self, units: &[StructuralUnit]) {
        let text = joined_text(units);
        if !language_utils::text_matches_language(&text, &self.config.source_language) {
            warn!(
                "Document does not look like {} text (detected: {})",
                self.config.source_language,
                language_utils::detect_script(&text)
            );
        }
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.show_progress || total == 0 {
            return None;
        }
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        bar.set_message("Translating");
        Some(bar)
    }
}

fn joined_text(units: &[StructuralUnit]) -> String {
    units
        .iter()
        .filter(|u| u.needs_translation())
        .map(StructuralUnit::source_text)
        .collect::<Vec<_>>()
        .join("\n")
}
