pub mod action_resolver;
pub mod config;
pub mod error;
pub mod processor;
pub mod report;
pub mod state_parser;
pub mod strategy;
pub mod widget_parser;

pub use config::{CommitMode, MalformedRecordPolicy, ModelConfig};
pub use error::LoaderError;
pub use processor::{LoadOutcome, ModelLoader, TraceSource, load_model};
pub use report::{IssueKind, LoadIssue, LoadPhase, LoadReport, TraceReport};
pub use strategy::ExecutionStrategy;
