use std::{fmt::Write, path::PathBuf};

use serde::Serialize;
use uuid::Uuid;

use super::action_resolver::ResolutionNote;
use super::error::LoaderError;

/// Orchestrator phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Init,
    Discovering,
    Dispatching,
    Draining,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MalformedRecord,
    UnresolvedState,
    WidgetResolution,
    IdRepair,
    InvalidTraceName,
    NotDispatched,
}

impl IssueKind {
    /// Failures make the model incomplete; the rest are repairs and warnings.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            IssueKind::UnresolvedState | IssueKind::NotDispatched
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadIssue {
    pub kind: IssueKind,
    pub source: PathBuf,
    pub trace: Option<Uuid>,
    pub line: Option<usize>,
    pub message: String,
}

/// Outcome of one trace worker.
#[derive(Debug, Serialize)]
pub struct TraceReport {
    pub source: PathBuf,
    pub trace: Uuid,
    pub committed: usize,
    pub issues: Vec<LoadIssue>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<LoaderError>,
}

impl TraceReport {
    pub fn new(source: PathBuf, trace: Uuid) -> Self {
        Self {
            source,
            trace,
            committed: 0,
            issues: Vec::new(),
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_fatal(&self) -> bool {
        self.error.as_ref().is_some_and(LoaderError::is_fatal)
    }

    pub fn issue(&mut self, kind: IssueKind, line: Option<usize>, message: impl Into<String>) {
        self.issues.push(LoadIssue {
            kind,
            source: self.source.clone(),
            trace: Some(self.trace),
            line,
            message: message.into(),
        });
    }

    pub fn note(&mut self, line: usize, note: &ResolutionNote) {
        match note {
            ResolutionNote::UnknownWidget { raw_id } => self.issue(
                IssueKind::WidgetResolution,
                Some(line),
                format!("target widget {} is not registered", raw_id),
            ),
            ResolutionNote::WidgetNotInSource { widget } => self.issue(
                IssueKind::WidgetResolution,
                Some(line),
                format!("target widget {} is not part of the source state", widget),
            ),
            ResolutionNote::IdsRepaired { original, repaired } => self.issue(
                IssueKind::IdRepair,
                Some(line),
                format!("{:?} -> {:?}", &original.fields[..original.fields.len().min(4)], &repaired.fields[..repaired.fields.len().min(4)]),
            ),
        }
    }
}

fn serialize_error<S: serde::Serializer>(error: &Option<LoaderError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// Summary of a whole load: per-trace results plus run-level issues.
#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub phase: LoadPhase,
    pub failed: bool,
    pub cancelled: bool,
    pub traces: Vec<TraceReport>,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self {
            phase: LoadPhase::Init,
            failed: false,
            cancelled: false,
            traces: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn committed_actions(&self) -> usize {
        self.traces.iter().map(|t| t.committed).sum()
    }

    /// Every issue of the run, run-level first.
    pub fn all_issues(&self) -> impl Iterator<Item = &LoadIssue> {
        self.issues
            .iter()
            .chain(self.traces.iter().flat_map(|t| t.issues.iter()))
    }

    pub fn issues_of(&self, kind: IssueKind) -> Vec<&LoadIssue> {
        self.all_issues().filter(|i| i.kind == kind).collect()
    }

    pub fn trace(&self, id: Uuid) -> Option<&TraceReport> {
        self.traces.iter().find(|t| t.trace == id)
    }

    /// Tab-separated rendering: one row per trace, then one row per issue.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "trace\tsource\tcommitted\tstatus");
        for t in &self.traces {
            let status = match &t.error {
                Some(e) => format!("failed: {}", e),
                None => "ok".to_string(),
            };
            let _ = writeln!(out, "{}\t{}\t{}\t{}", t.trace, t.source.display(), t.committed, status);
        }

        let issues: Vec<_> = self.all_issues().collect();
        if !issues.is_empty() {
            let _ = writeln!(out, "\nkind\tsource\tline\tmessage");
            for i in issues {
                let line = i.line.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
                let _ = writeln!(out, "{:?}\t{}\t{}\t{}", i.kind, i.source.display(), line, i.message);
            }
        }

        let _ = writeln!(
            out,
            "\nphase={:?} failed={} cancelled={} actions={}",
            self.phase,
            self.failed,
            self.cancelled,
            self.committed_actions()
        );
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for LoadReport {
    fn default() -> Self {
        Self::new()
    }
}
