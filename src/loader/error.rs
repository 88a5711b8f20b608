use std::{io, path::Path, path::PathBuf};

use thiserror::Error;

use crate::model::ModelError;
use crate::storage::ReadError;

#[derive(Debug, Error)]
pub enum LoaderError {
    /// Tokenizing failed (`MalformedRecord`) or the source could not be read.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The source state of an action was never registered.
    #[error("unresolved source state '{raw_id}' (line {line})")]
    UnresolvedState { raw_id: String, line: usize },

    #[error("no state record for '{raw_id}' at {path}")]
    MissingStateRecord { raw_id: String, path: PathBuf },

    #[error("trace file name '{name}' does not carry a trace id")]
    InvalidTraceName { name: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("worker task failed: {0}")]
    WorkerPanic(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl LoaderError {
    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        LoaderError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Fatal errors cancel the run; everything else only fails its own trace.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoaderError::Model(_) | LoaderError::WorkerPanic(_))
    }

    pub fn is_malformed_record(&self) -> bool {
        matches!(self, LoaderError::Read(e) if e.is_malformed())
    }
}
