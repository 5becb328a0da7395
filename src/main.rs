// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use doctrans::app_config::{self, Config, FailurePolicy, TranslationProvider};
use doctrans::app_controller::{Controller, TranslateOptions};
use doctrans::glossary::DictionaryScope;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "deepseek")]
    DeepSeek,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::DeepSeek => TranslationProvider::DeepSeek,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for DictionaryScope to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDictionaryScope {
    Permanent,
    Temp,
}

impl From<CliDictionaryScope> for DictionaryScope {
    fn from(scope: CliDictionaryScope) -> Self {
        match scope {
            CliDictionaryScope::Permanent => DictionaryScope::Permanent,
            CliDictionaryScope::Temp => DictionaryScope::Temp,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document (default command)
    Translate(TranslateArgs),

    /// Edit or inspect the term dictionaries
    Dict {
        #[command(subcommand)]
        action: DictAction,
    },

    /// Write candidate terms of a document to its temp dictionary for review
    ExtractTerms {
        /// Document to scan
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        dictionaries: DictionaryPaths,
    },

    /// Generate shell completions for doctrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum DictAction {
    /// Add or update a term
    Add {
        term: String,
        translation: String,
        #[command(flatten)]
        target: DictionaryTarget,
    },
    /// Remove a term
    Remove {
        term: String,
        #[command(flatten)]
        target: DictionaryTarget,
    },
    /// List all terms of a dictionary
    List {
        #[command(flatten)]
        target: DictionaryTarget,
    },
    /// Remove every term of a dictionary
    Clear {
        #[command(flatten)]
        target: DictionaryTarget,
    },
}

#[derive(Args, Debug)]
struct DictionaryTarget {
    /// Dictionary to edit
    #[arg(long, value_enum, default_value = "permanent")]
    scope: CliDictionaryScope,

    #[command(flatten)]
    dictionaries: DictionaryPaths,
}

#[derive(Args, Debug, Clone, Default)]
struct DictionaryPaths {
    /// Permanent dictionary file
    #[arg(long)]
    permanent_dict: Option<PathBuf>,

    /// Temp dictionary file (default: <input stem>_temp_dict.json)
    #[arg(long)]
    temp_dict: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Document to translate
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    flags: TranslateFlags,
}

#[derive(Args, Debug, Clone, Default)]
struct TranslateFlags {
    /// Output file (default: <input stem>_translated.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'ja')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh')
    #[arg(short, long)]
    target_language: Option<String>,

    #[command(flatten)]
    dictionaries: DictionaryPaths,

    /// Maximum units per request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Abort when a unit cannot be translated instead of keeping its source text
    #[arg(long)]
    fail_closed: bool,

    /// Do not copy formatting attributes onto the output
    #[arg(long)]
    no_preserve_format: bool,

    /// Extract candidate terms into the temp dictionary before translating
    #[arg(long)]
    extract_terms: bool,

    /// Translate with the offline mock backend
    #[arg(long)]
    dry_run: bool,
}

/// doctrans - Dictionary-constrained document translation
///
/// Translates documents unit by unit with AI providers, enforcing
/// terminology from permanent and per-document dictionaries.
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version)]
#[command(about = "Dictionary-constrained document translation")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "doctrans translates documents paragraph by paragraph with AI providers while keeping terminology consistent.

EXAMPLES:
    doctrans report.txt                          # Translate using default config
    doctrans -f report.txt                       # Force overwrite existing output
    doctrans -p deepseek report.json             # Use a specific provider
    doctrans -s ja -t zh --fail-closed doc.txt   # Abort on any untranslated unit
    doctrans extract-terms report.txt            # Write report_temp_dict.json for review
    doctrans dict add 東京 东京                  # Add a permanent dictionary term
    doctrans dict list --scope temp --temp-dict report_temp_dict.json
    doctrans completions bash > doctrans.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

SUPPORTED PROVIDERS:
    ollama   - Local Ollama server (default: qwen2.5)
    openai   - OpenAI API (requires API key or OPENAI_API_KEY)
    deepseek - DeepSeek API (requires API key or DEEPSEEK_API_KEY)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document to translate
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    #[command(flatten)]
    flags: TranslateFlags,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "\x1B[1;31m"),
            Level::Warn => ("🚧 ", "\x1B[1;33m"),
            Level::Info => (" ", "\x1B[1;32m"),
            Level::Debug => ("🔍 ", "\x1B[1;36m"),
            Level::Trace => ("📋 ", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set with set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => {
            run_translate(&args.input, args.flags, &cli.config_path, cli.log_level).await
        }
        Some(Commands::Dict { action }) => run_dict(action, &cli.config_path, cli.log_level),
        Some(Commands::ExtractTerms { input, dictionaries }) => {
            let config = load_config(&cli.config_path, cli.log_level, |config| {
                apply_dictionary_paths(config, &dictionaries)
            })?;
            let controller = Controller::with_config(config)?;
            let (path, count) = controller.extract_terms(&input)?;
            info!("Wrote {} entries to {:?}; review it before translating", count, path);
            Ok(())
        }
        None => {
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;
            run_translate(&input, cli.flags, &cli.config_path, cli.log_level).await
        }
    }
}

/// Load the config, apply CLI overrides, validate and set the log level
fn load_config(
    config_path: &str,
    log_level: Option<CliLogLevel>,
    overrides: impl FnOnce(&mut Config),
) -> Result<Config> {
    let mut config = Config::load_or_create(Path::new(config_path))?;
    overrides(&mut config);
    if let Some(level) = log_level {
        config.log_level = level.into();
    }

    config.validate().map_err(|e| anyhow!("Configuration validation failed: {:#}", e))?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

fn apply_dictionary_paths(config: &mut Config, paths: &DictionaryPaths) {
    if let Some(path) = &paths.permanent_dict {
        config.dictionary.permanent_path = path.clone();
    }
    if let Some(path) = &paths.temp_dict {
        config.dictionary.temp_path = Some(path.clone());
    }
}

fn apply_translate_flags(config: &mut Config, flags: &TranslateFlags) {
    if let Some(provider) = &flags.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &flags.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_lang) = &flags.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &flags.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(chunk_size) = flags.chunk_size {
        config.orchestration.max_chunk_size = chunk_size;
    }
    if flags.fail_closed {
        config.orchestration.failure_policy = FailurePolicy::FailClosed;
    }
    if flags.no_preserve_format {
        config.preserve_format = false;
    }
    if flags.extract_terms {
        config.dictionary.extract_terms = true;
    }
    apply_dictionary_paths(config, &flags.dictionaries);
}

async fn run_translate(
    input: &Path,
    flags: TranslateFlags,
    config_path: &str,
    log_level: Option<CliLogLevel>,
) -> Result<()> {
    let config = load_config(config_path, log_level, |config| apply_translate_flags(config, &flags))?;
    let controller = Controller::with_config(config)?;

    let token = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling translation...");
            token.cancel();
        }
    });

    let options = TranslateOptions {
        input: input.to_path_buf(),
        output: flags.output,
        force_overwrite: flags.force_overwrite,
        dry_run: flags.dry_run,
    };
    let report = controller.run(&options).await?;

    if !report.fallback_ids.is_empty() {
        warn!("Units kept in the source language: {}", report.fallback_ids.join(", "));
    }
    Ok(())
}

fn run_dict(action: DictAction, config_path: &str, log_level: Option<CliLogLevel>) -> Result<()> {
    let target = match &action {
        DictAction::Add { target, .. }
        | DictAction::Remove { target, .. }
        | DictAction::List { target }
        | DictAction::Clear { target } => target,
    };
    let scope: DictionaryScope = target.scope.into();
    let temp_path = target.dictionaries.temp_dict.clone();
    if scope == DictionaryScope::Temp && temp_path.is_none() {
        return Err(anyhow!("--temp-dict is required for the temp dictionary"));
    }

    let config = load_config(config_path, log_level, |config| {
        apply_dictionary_paths(config, &target.dictionaries)
    })?;
    let controller = Controller::with_config(config)?;
    let temp_path = temp_path.as_deref();

    match &action {
        DictAction::Add { term, translation, .. } => {
            if controller.dict_add(scope, temp_path, term, translation)? {
                info!("Added {} → {} to the {} dictionary", term, translation, scope);
            } else {
                info!("{} → {} is already in the {} dictionary", term, translation, scope);
            }
        }
        DictAction::Remove { term, .. } => {
            if controller.dict_remove(scope, temp_path, term)? {
                info!("Removed {} from the {} dictionary", term, scope);
            } else {
                info!("{} is not in the {} dictionary", term, scope);
            }
        }
        DictAction::List { .. } => {
            let entries = controller.dict_list(scope, temp_path)?;
            for (term, translation) in &entries {
                println!("{}\t{}", term, translation);
            }
            info!("{} entries in the {} dictionary", entries.len(), scope);
        }
        DictAction::Clear { .. } => {
            controller.dict_clear(scope, temp_path)?;
            info!("Cleared the {} dictionary", scope);
        }
    }
    Ok(())
}
