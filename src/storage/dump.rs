use std::{fs, path::Path};

use tracing::info;

use crate::loader::{config::ModelConfig, error::LoaderError};
use crate::model::{Action, Model, Widget};

use super::schema::{TRACE_SCHEMA, WIDGET_SCHEMA};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub states: usize,
    pub traces: usize,
}

/// Write the model in the record layout the loader reads, using canonical ids
/// only. The empty state has no file; it is seeded on load.
pub fn dump_model(model: &Model, config: &ModelConfig) -> Result<DumpSummary, LoaderError> {
    let sep = config.separator;
    let states_dir = config.states_path();
    fs::create_dir_all(&states_dir).map_err(|e| LoaderError::write(&states_dir, e))?;

    let mut summary = DumpSummary::default();
    for state in model.states().iter().filter(|s| !s.is_empty_state()) {
        let mut out = WIDGET_SCHEMA.header_line(sep);
        out.push('\n');
        for widget in &state.widgets {
            out.push_str(&widget_fields(widget, sep).join(&sep.to_string()));
            out.push('\n');
        }
        let path = states_dir.join(format!("{}.csv", state.id));
        write_file(&path, &out)?;
        summary.states += 1;
    }

    for trace in model.traces() {
        let mut out = TRACE_SCHEMA.header_line(sep);
        out.push('\n');
        for action in trace.actions() {
            out.push_str(&action_fields(action, sep).join(&sep.to_string()));
            out.push('\n');
        }
        write_file(&config.trace_path(trace.id), &out)?;
        summary.traces += 1;
    }

    info!(
        base_dir = %config.base_dir.display(),
        states = summary.states,
        traces = summary.traces,
        "model dumped"
    );
    Ok(summary)
}

/// Serialise an action into trace-record fields.
pub fn action_fields(action: &Action, sep: char) -> Vec<String> {
    vec![
        action.action_type.to_string(),
        action.src_state.to_string(),
        action.res_state.to_string(),
        action.target_widget.map(|w| w.to_string()).unwrap_or_default(),
        sanitize(&action.data, sep),
        action.start_ms.map(|t| t.to_string()).unwrap_or_default(),
        action.end_ms.map(|t| t.to_string()).unwrap_or_default(),
        action.successful.to_string(),
        sanitize(&action.exception, sep),
        serde_json::to_string(&action.device_logs).unwrap_or_else(|_| "[]".to_string()),
    ]
}

pub fn widget_fields(widget: &Widget, sep: char) -> Vec<String> {
    vec![
        widget.id.to_string(),
        widget.class_name.clone(),
        widget.resource_id.clone(),
        widget.package_name.clone(),
        widget.xpath.clone(),
        sanitize(&widget.text, sep),
        widget.clickable.to_string(),
        widget.long_clickable.to_string(),
        widget.input_field.to_string(),
        widget.scrollable.to_string(),
        widget.parent_id.map(|p| p.to_string()).unwrap_or_default(),
        widget.bounds.to_string(),
    ]
}

// Free text must not break the line-oriented layout.
fn sanitize(text: &str, sep: char) -> String {
    text.chars()
        .map(|c| if c == sep || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn write_file(path: &Path, content: &str) -> Result<(), LoaderError> {
    fs::write(path, content).map_err(|e| LoaderError::write(path, e))
}
