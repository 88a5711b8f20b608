use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::feature::ModelFeature;
use crate::model::{Model, State};
use crate::storage::{
    ContentReader,
    schema::{TRACE_SCHEMA, trace_fields},
};

use super::{
    action_resolver::ActionResolver,
    config::{MalformedRecordPolicy, ModelConfig},
    error::LoaderError,
    report::{IssueKind, LoadIssue, LoadPhase, LoadReport, TraceReport},
    state_parser::StateParser,
    strategy::Pending,
    widget_parser::WidgetParser,
};

/// A discovered trace file and the id carried in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSource {
    pub path: PathBuf,
    pub trace_id: Uuid,
}

pub struct LoadOutcome {
    pub model: Arc<Model>,
    pub report: LoadReport,
}

/// Everything a trace worker needs, shared between workers.
struct LoaderContext {
    config: Arc<ModelConfig>,
    model: Arc<Model>,
    reader: ContentReader,
    state_parser: Arc<StateParser>,
    resolver: ActionResolver,
    per_action: bool,
}

/// Builds a model from every trace file of a base directory.
///
/// Traces are processed by a bounded pool of workers. A failing trace is
/// reported and the others still complete; only fatal errors stop the
/// dispatch of further traces.
pub struct ModelLoader {
    ctx: Arc<LoaderContext>,
    cancel: CancellationToken,
    report: LoadReport,
}

impl ModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_watchers(config, Vec::new())
    }

    pub fn with_watchers(config: ModelConfig, watchers: Vec<Arc<dyn ModelFeature>>) -> Self {
        let config = Arc::new(config);
        let model = Arc::new(Model::with_watchers(watchers));
        let widget_parser = Arc::new(WidgetParser::new(model.clone()));
        let state_parser = Arc::new(StateParser::new(model.clone(), widget_parser.clone(), config.clone()));
        let resolver = ActionResolver::new(widget_parser, state_parser.clone());
        let per_action = config.per_action_commits(model.has_watchers());

        Self {
            ctx: Arc::new(LoaderContext {
                reader: config.reader(),
                config,
                model,
                state_parser,
                resolver,
                per_action,
            }),
            cancel: CancellationToken::new(),
            report: LoadReport::new(),
        }
    }

    pub fn model(&self) -> Arc<Model> {
        self.ctx.model.clone()
    }

    /// Token checked before each dispatch. Cancelling it stops new traces
    /// from starting; running workers finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the whole load. Errors only when the base directory cannot be
    /// listed; trace failures are reported in the returned `LoadReport`.
    pub async fn load(mut self) -> Result<LoadOutcome, LoaderError> {
        // Init: the empty state is seeded by `Model::new`
        debug!(base_dir = %self.ctx.config.base_dir.display(), "model loading started");

        self.enter(LoadPhase::Discovering);
        let sources = self.discover().await?;
        info!(traces = sources.len(), "trace sources discovered");

        self.enter(LoadPhase::Dispatching);
        let workers = self.ctx.config.effective_workers();
        let mut running: JoinSet<TraceReport> = JoinSet::new();
        let mut origins: HashMap<tokio::task::Id, TraceSource> = HashMap::new();

        // the join set is the pool; completions are absorbed before each dispatch
        let mut queue = sources.into_iter();
        while let Some(source) = queue.next() {
            while running.len() >= workers {
                match running.join_next_with_id().await {
                    Some(done) => self.absorb(done, &mut origins),
                    None => break,
                }
            }
            while let Some(done) = running.try_join_next_with_id() {
                self.absorb(done, &mut origins);
            }
            if self.cancel.is_cancelled() {
                self.skip_remaining(std::iter::once(source).chain(queue.by_ref()));
                break;
            }

            let ctx = self.ctx.clone();
            let origin = source.clone();
            let handle = running.spawn(process_trace(ctx, source));
            origins.insert(handle.id(), origin);
        }

        self.enter(LoadPhase::Draining);
        while let Some(done) = running.join_next_with_id().await {
            self.absorb(done, &mut origins);
        }

        self.ctx.state_parser.clear();
        self.enter(LoadPhase::Done);
        for watcher in self.ctx.model.watchers() {
            watcher.on_load_finished(&self.ctx.model);
        }

        info!(
            states = self.ctx.model.state_count(),
            widgets = self.ctx.model.widget_count(),
            traces = self.ctx.model.trace_count(),
            actions = self.ctx.model.action_count(),
            failed = self.report.failed,
            "model loading finished"
        );

        Ok(LoadOutcome {
            model: self.ctx.model.clone(),
            report: self.report,
        })
    }

    fn enter(&mut self, phase: LoadPhase) {
        debug_assert!(phase > self.report.phase);
        debug!(from = ?self.report.phase, to = ?phase, "load phase");
        self.report.phase = phase;
    }

    /// List the trace files of the base directory, sorted by path.
    async fn discover(&mut self) -> Result<Vec<TraceSource>, LoaderError> {
        let config = &self.ctx.config;
        let base_dir = &config.base_dir;
        let mut entries = tokio::fs::read_dir(base_dir).await.map_err(|e| {
            LoaderError::Config(format!("cannot list {}: {}", base_dir.display(), e))
        })?;

        let mut sources = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(LoaderError::Config(format!(
                        "cannot list {}: {}",
                        base_dir.display(),
                        e
                    )));
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&config.trace_prefix) {
                continue;
            }
            match config.trace_id_from_name(&name) {
                Some(trace_id) => sources.push(TraceSource {
                    path: entry.path(),
                    trace_id,
                }),
                None => {
                    let err = LoaderError::InvalidTraceName { name: name.clone() };
                    warn!(%err, "skipping trace file");
                    self.report.issues.push(LoadIssue {
                        kind: IssueKind::InvalidTraceName,
                        source: entry.path(),
                        trace: None,
                        line: None,
                        message: err.to_string(),
                    });
                }
            }
        }

        sources.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(sources)
    }

    fn absorb(
        &mut self,
        done: Result<(tokio::task::Id, TraceReport), JoinError>,
        origins: &mut HashMap<tokio::task::Id, TraceSource>,
    ) {
        let report = match done {
            Ok((id, report)) => {
                origins.remove(&id);
                report
            }
            Err(join_error) => {
                let source = origins.remove(&join_error.id());
                let (path, trace) = source
                    .map(|s| (s.path, s.trace_id))
                    .unwrap_or_else(|| (PathBuf::new(), Uuid::nil()));
                let mut report = TraceReport::new(path, trace);
                report.error = Some(LoaderError::WorkerPanic(join_error.to_string()));
                report
            }
        };

        if let Some(err) = &report.error {
            error!(source = %report.source.display(), trace = %report.trace, %err, "trace processing failed");
            self.report.failed = true;
            if err.is_fatal() && !self.cancel.is_cancelled() {
                warn!("fatal error, no further traces will be dispatched");
                self.cancel.cancel();
            }
        } else {
            debug!(source = %report.source.display(), committed = report.committed, "trace consumed");
        }
        if report.issues.iter().any(|i| i.kind.is_failure()) {
            self.report.failed = true;
        }
        self.report.traces.push(report);
    }

    fn skip_remaining(&mut self, sources: impl Iterator<Item = TraceSource>) {
        self.report.cancelled = true;
        self.report.failed = true;
        for source in sources {
            self.report.issues.push(LoadIssue {
                kind: IssueKind::NotDispatched,
                source: source.path,
                trace: Some(source.trace_id),
                line: None,
                message: "run cancelled before dispatch".to_string(),
            });
        }
    }
}

/// Process one trace file: read records in order, schedule their result-state
/// loads, then settle and resolve them in file order and commit the actions.
async fn process_trace(ctx: Arc<LoaderContext>, source: TraceSource) -> TraceReport {
    let mut report = TraceReport::new(source.path.clone(), source.trace_id);
    debug!(source = %source.path.display(), "processing trace");

    let handle = match ctx.model.init_new_trace(source.trace_id) {
        Ok(handle) => handle,
        Err(e) => {
            report.error = Some(e.into());
            return report;
        }
    };

    let mut stream = match ctx.reader.open(&source.path, TRACE_SCHEMA).await {
        Ok(stream) => stream,
        Err(e) => {
            report.error = Some(e.into());
            return report;
        }
    };

    let mut pending: Vec<(usize, _, Pending<Arc<State>>)> = Vec::new();
    let mut index = 0;
    while let Some(next) = stream.next_record().await {
        match next {
            Ok(record) => {
                let parser = ctx.state_parser.clone();
                let raw_res = record.field(trace_fields::RES_STATE).to_string();
                let res = ctx
                    .config
                    .strategy
                    .schedule(async move { parser.resolve(&raw_res).await })
                    .await;
                pending.push((index, record, res));
                index += 1;
            }
            Err(e) if e.is_malformed() && ctx.config.malformed_records == MalformedRecordPolicy::Skip => {
                warn!(%e, "skipping malformed record");
                report.issue(IssueKind::MalformedRecord, None, e.to_string());
            }
            Err(e) => {
                if e.is_malformed() {
                    report.issue(IssueKind::MalformedRecord, None, e.to_string());
                }
                report.error = Some(e.into());
                break;
            }
        }
    }
    drop(stream);

    let mut batch = Vec::new();
    for (index, record, res) in pending {
        let result_state = match res.settle().await {
            Ok(state) => state,
            Err(e) => {
                // earlier in the file than any read error
                report.error = Some(e);
                break;
            }
        };

        let resolution = match ctx.resolver.resolve(index, &record, result_state) {
            Ok(resolution) => resolution,
            Err(e) => {
                error!(source = %source.path.display(), line = record.line, %e, "action dropped");
                report.issue(IssueKind::UnresolvedState, Some(record.line), e.to_string());
                continue;
            }
        };
        for note in &resolution.notes {
            report.note(record.line, note);
        }

        if ctx.per_action {
            if let Err(e) = ctx.model.append(&handle, resolution.action) {
                report.error = Some(e.into());
                return report;
            }
            report.committed += 1;
        } else {
            batch.push(resolution.action);
        }
    }

    if !batch.is_empty() {
        match ctx.model.append_all(&handle, batch) {
            Ok(count) => report.committed += count,
            Err(e) => report.error = Some(e.into()),
        }
    }

    debug!(source = %source.path.display(), committed = report.committed, "trace processed");
    report
}

/// Load the model of `config.base_dir` with no watchers.
pub async fn load_model(config: ModelConfig) -> Result<LoadOutcome, LoaderError> {
    ModelLoader::new(config).load().await
}
