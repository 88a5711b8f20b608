use thiserror::Error;
use uuid::Uuid;

use super::identity::{StateId, WidgetId};

/// Violations of the model's global invariants. Any of these indicates a
/// resolver bug rather than bad input, so the loader treats them as fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("trace {0} is already registered")]
    DuplicateTrace(Uuid),

    #[error("unknown trace handle {0}")]
    UnknownTrace(Uuid),

    #[error("action {index} of trace {trace} references unregistered state {state}")]
    DanglingState {
        trace: Uuid,
        index: usize,
        state: StateId,
    },

    #[error("action {index} of trace {trace} targets widget {widget} outside its source state")]
    DanglingWidget {
        trace: Uuid,
        index: usize,
        widget: WidgetId,
    },

    #[error("action {index} of trace {trace} does not follow action {last}")]
    OutOfOrder { trace: Uuid, last: usize, index: usize },
}
