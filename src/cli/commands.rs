use std::{path::Path, sync::Arc};

use tracing::info;

use crate::cli::config::{AppConfig, SourceArgs, build_model_config};
use crate::feature::{ActionTypeCount, ModelFeature, WidgetTextTrace};
use crate::loader::{LoadOutcome, ModelLoader};
use crate::model::Model;
use crate::storage::dump::dump_model;

// ============================================================================
// logging
// ============================================================================

/// Install the tracing subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// load subcommand
// ============================================================================

/// Load a model and print its report. Returns whether the run succeeded.
pub async fn cmd_load(
    source: &SourceArgs,
    config: &AppConfig,
    format: &str,
    features_out: Option<&Path>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let model_config = build_model_config(source, config)?;

    let counts = Arc::new(ActionTypeCount::new());
    let widget_trace = Arc::new(WidgetTextTrace::new());
    let watchers: Vec<Arc<dyn ModelFeature>> = match features_out {
        Some(_) => vec![counts.clone(), widget_trace.clone()],
        None => vec![],
    };

    let LoadOutcome { model, report } = ModelLoader::with_watchers(model_config, watchers)
        .load()
        .await?;

    match format {
        "json" => println!("{}", report.to_json()?),
        _ => {
            print!("{}", report.to_table());
            println!("{}", model_summary(&model));
        }
    }

    if let Some(dir) = features_out {
        std::fs::create_dir_all(dir)?;
        for feature in model.watchers() {
            let path = dir.join(format!("{}.txt", feature.name()));
            std::fs::write(&path, feature.report())?;
            info!(path = %path.display(), "feature report written");
        }
    }

    Ok(!report.is_failed())
}

// ============================================================================
// dump subcommand
// ============================================================================

pub async fn cmd_dump(
    source: &SourceArgs,
    config: &AppConfig,
    out: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let model_config = build_model_config(source, config)?;
    let target = model_config.clone().with_base_dir(out);

    let LoadOutcome { model, report } = ModelLoader::new(model_config).load().await?;
    let summary = dump_model(&model, &target)?;

    println!(
        "Dumped {} states and {} traces to {}",
        summary.states,
        summary.traces,
        out.display()
    );
    if report.is_failed() {
        eprintln!("{}", report.to_table());
    }
    Ok(!report.is_failed())
}

// ============================================================================
// Helpers
// ============================================================================

pub fn model_summary(model: &Model) -> String {
    format!(
        "Model: {} states, {} widgets, {} traces, {} actions",
        model.state_count(),
        model.widget_count(),
        model.trace_count(),
        model.action_count()
    )
}
