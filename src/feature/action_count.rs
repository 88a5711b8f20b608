use std::{collections::BTreeMap, fmt::Write};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::{Action, ActionType, State};

use super::ModelFeature;

/// Counts committed actions per action type.
#[derive(Default)]
pub struct ActionTypeCount {
    counts: Mutex<BTreeMap<ActionType, usize>>,
}

impl ActionTypeCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, action_type: &ActionType) -> usize {
        self.counts.lock().get(action_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().values().sum()
    }
}

impl ModelFeature for ActionTypeCount {
    fn name(&self) -> &str {
        "actionTypeCount"
    }

    fn on_new_action(&self, _trace: Uuid, action: &Action, _result: &State) {
        *self
            .counts
            .lock()
            .entry(action.action_type.clone())
            .or_insert(0) += 1;
    }

    fn report(&self) -> String {
        let mut out = String::from("action\tcount\n");
        for (action_type, count) in self.counts.lock().iter() {
            let _ = writeln!(out, "{}\t{}", action_type, count);
        }
        out
    }
}
