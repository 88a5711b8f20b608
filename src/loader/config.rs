use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{
    ContentReader, RecordSchema,
    schema::{LEGACY_WIDGET_SCHEMA, WIDGET_SCHEMA},
};

use super::strategy::ExecutionStrategy;

pub const DEFAULT_WORKERS: usize = 5;

/// What to do with a trace line that has too few fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRecordPolicy {
    /// Keep the actions before the bad line, stop the trace and fail the run.
    #[default]
    AbortTrace,
    /// Log the line, record an issue and continue with the next one.
    Skip,
}

/// Granularity of trace commits into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Batch when no watcher is registered, per action otherwise.
    #[default]
    Auto,
    Batch,
    PerAction,
}

/// Loader settings for one app's model directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_dir: PathBuf,

    #[serde(default = "default_trace_prefix")]
    pub trace_prefix: String,

    #[serde(default = "default_states_dir")]
    pub states_dir: String,

    #[serde(default = "default_separator")]
    pub separator: char,

    /// Upper bound of concurrently processed traces (ignored when sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub strategy: ExecutionStrategy,

    /// Accept the legacy widget layout
    #[serde(default)]
    pub compatibility_mode: bool,

    #[serde(default)]
    pub malformed_records: MalformedRecordPolicy,

    #[serde(default)]
    pub commit_mode: CommitMode,
}

fn default_trace_prefix() -> String { "trace".to_string() }
fn default_states_dir() -> String { "states".to_string() }
fn default_separator() -> char { ';' }
fn default_workers() -> usize { DEFAULT_WORKERS }

impl ModelConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            trace_prefix: default_trace_prefix(),
            states_dir: default_states_dir(),
            separator: default_separator(),
            workers: default_workers(),
            strategy: ExecutionStrategy::default(),
            compatibility_mode: false,
            malformed_records: MalformedRecordPolicy::default(),
            commit_mode: CommitMode::default(),
        }
    }

    /// `<output_dir>/model/<app_name>`
    pub fn for_app(output_dir: impl AsRef<Path>, app_name: &str) -> Self {
        Self::new(output_dir.as_ref().join("model").join(app_name))
    }

    pub fn sequential(mut self) -> Self {
        self.strategy = ExecutionStrategy::Sequential;
        self.workers = 1;
        self
    }

    pub fn parallel(mut self, workers: usize) -> Self {
        self.strategy = ExecutionStrategy::Parallel;
        self.workers = workers;
        self
    }

    pub fn with_compatibility_mode(mut self, enabled: bool) -> Self {
        self.compatibility_mode = enabled;
        self
    }

    pub fn with_malformed_records(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_records = policy;
        self
    }

    pub fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.commit_mode = mode;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn is_sequential(&self) -> bool {
        self.strategy == ExecutionStrategy::Sequential
    }

    /// Worker pool size actually used: 1 when sequential, at least 1 otherwise.
    pub fn effective_workers(&self) -> usize {
        if self.is_sequential() { 1 } else { self.workers.max(1) }
    }

    pub fn per_action_commits(&self, has_watchers: bool) -> bool {
        match self.commit_mode {
            CommitMode::Auto => has_watchers,
            CommitMode::Batch => false,
            CommitMode::PerAction => true,
        }
    }

    pub fn widget_schema(&self) -> RecordSchema {
        if self.compatibility_mode { LEGACY_WIDGET_SCHEMA } else { WIDGET_SCHEMA }
    }

    pub fn reader(&self) -> ContentReader {
        ContentReader::new(self.separator)
    }

    pub fn states_path(&self) -> PathBuf {
        self.base_dir.join(&self.states_dir)
    }

    pub fn state_path(&self, raw_id: &str) -> PathBuf {
        self.states_path().join(format!("{}.csv", raw_id))
    }

    pub fn trace_path(&self, id: Uuid) -> PathBuf {
        self.base_dir
            .join(format!("{}{}.csv", self.trace_prefix, id.hyphenated()))
    }

    /// Extract the trace id from a file name carrying the trace prefix.
    pub fn trace_id_from_name(&self, file_name: &str) -> Option<Uuid> {
        let rest = file_name.strip_prefix(&self.trace_prefix)?;
        let stem = rest.rsplit_once('.').map_or(rest, |(stem, _)| stem);
        Uuid::parse_str(stem).ok()
    }
}
