use uuid::Uuid;

use super::action::Action;
use super::error::ModelError;

/// Handle returned by `Model::init_new_trace`, required for every append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHandle {
    pub(crate) slot: usize,
    pub id: Uuid,
}

/// Append-only, strictly ordered action list of one exploration run.
#[derive(Debug, Clone)]
pub struct Trace {
    pub id: Uuid,
    actions: Vec<Action>,
}

impl Trace {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            actions: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn last(&self) -> Option<&Action> {
        self.actions.last()
    }

    pub(crate) fn check_order(&self, prev: Option<usize>, action: &Action) -> Result<(), ModelError> {
        let last = prev.or_else(|| self.actions.last().map(|a| a.index));
        match last {
            Some(last) if action.index <= last => Err(ModelError::OutOfOrder {
                trace: self.id,
                last,
                index: action.index,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub(crate) fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions.extend(actions);
    }
}
