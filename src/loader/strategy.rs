use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::error::LoaderError;

/// How the per-record parse work of a trace is executed.
///
/// `Sequential` runs each task to completion when it is scheduled, which
/// makes builds reproducible. `Parallel` spawns it on the runtime; the caller
/// settles the pending results in file order either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    Sequential,
    #[default]
    Parallel,
}

impl ExecutionStrategy {
    pub async fn schedule<F, T>(&self, task: F) -> Pending<T>
    where
        F: Future<Output = Result<T, LoaderError>> + Send + 'static,
        T: Send + 'static,
    {
        match self {
            ExecutionStrategy::Sequential => Pending::Ready(task.await),
            ExecutionStrategy::Parallel => Pending::Scheduled(tokio::spawn(task)),
        }
    }
}

pub enum Pending<T> {
    Ready(Result<T, LoaderError>),
    Scheduled(JoinHandle<Result<T, LoaderError>>),
}

impl<T> Pending<T> {
    pub async fn settle(self) -> Result<T, LoaderError> {
        match self {
            Pending::Ready(result) => result,
            Pending::Scheduled(handle) => handle
                .await
                .map_err(|e| LoaderError::WorkerPanic(e.to_string()))?,
        }
    }
}
