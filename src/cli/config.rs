use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::loader::{
    CommitMode, ExecutionStrategy, LoaderError, MalformedRecordPolicy, ModelConfig,
    config::DEFAULT_WORKERS,
};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "explore-model",
    version,
    about = "Build exploration models from recorded UI traces"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: explore-model.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a model and print the load report
    Load {
        #[command(flatten)]
        source: SourceArgs,

        /// Report format: table or json
        #[arg(long, default_value = "table")]
        format: String,

        /// Directory for model feature reports (action counts, widget trace)
        #[arg(long)]
        features_out: Option<PathBuf>,
    },

    /// Load a model and write the repaired model to another directory
    Dump {
        #[command(flatten)]
        source: SourceArgs,

        /// Target base directory
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Where the model lives and how to load it.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Model base directory containing trace files and the states folder
    #[arg(long, conflicts_with_all = ["output_dir", "app_name"])]
    pub base_dir: Option<PathBuf>,

    /// Exploration output directory (used with --app-name)
    #[arg(long, requires = "app_name")]
    pub output_dir: Option<PathBuf>,

    /// App whose model is loaded from <output-dir>/model/<app-name>
    #[arg(long, requires = "output_dir")]
    pub app_name: Option<String>,

    /// Process traces one at a time, for reproducible builds
    #[arg(long)]
    pub sequential: bool,

    /// Concurrent trace workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Accept the legacy widget record layout
    #[arg(long)]
    pub compat: bool,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `explore-model.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub loader: LoaderSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSection {
    #[serde(default = "default_trace_prefix")]
    pub trace_prefix: String,

    #[serde(default = "default_separator")]
    pub separator: char,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub strategy: ExecutionStrategy,

    #[serde(default)]
    pub compatibility_mode: bool,

    #[serde(default)]
    pub malformed_records: MalformedRecordPolicy,

    #[serde(default)]
    pub commit_mode: CommitMode,
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            trace_prefix: default_trace_prefix(),
            separator: default_separator(),
            workers: default_workers(),
            strategy: ExecutionStrategy::default(),
            compatibility_mode: false,
            malformed_records: MalformedRecordPolicy::default(),
            commit_mode: CommitMode::default(),
        }
    }
}

// Serde default helpers
fn default_trace_prefix() -> String { "trace".to_string() }
fn default_separator() -> char { ';' }
fn default_workers() -> usize { DEFAULT_WORKERS }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("explore-model.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build a ModelConfig from the config file, overridden by CLI flags.
pub fn build_model_config(source: &SourceArgs, config: &AppConfig) -> Result<ModelConfig, LoaderError> {
    let base = match (&source.base_dir, &source.output_dir, &source.app_name) {
        (Some(base_dir), _, _) => ModelConfig::new(base_dir),
        (None, Some(output_dir), Some(app_name)) => ModelConfig::for_app(output_dir, app_name),
        _ => {
            return Err(LoaderError::Config(
                "either --base-dir or --output-dir with --app-name is required".to_string(),
            ));
        }
    };

    let section = &config.loader;
    let mut model_config = ModelConfig {
        trace_prefix: section.trace_prefix.clone(),
        separator: section.separator,
        workers: source.workers.unwrap_or(section.workers),
        strategy: section.strategy,
        compatibility_mode: section.compatibility_mode || source.compat,
        malformed_records: section.malformed_records,
        commit_mode: section.commit_mode,
        ..base
    };
    if source.sequential {
        model_config = model_config.sequential();
    }
    Ok(model_config)
}
