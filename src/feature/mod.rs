use std::sync::Arc;

use uuid::Uuid;

use crate::model::{Action, Model, State};

pub mod action_count;
pub mod widget_trace;

pub use action_count::ActionTypeCount;
pub use widget_trace::WidgetTextTrace;

/// Observer of committed actions.
///
/// Registered watchers switch the loader to per-action commits (unless the
/// commit mode is forced), so `on_new_action` sees every action in trace order.
pub trait ModelFeature: Send + Sync {
    fn name(&self) -> &str;

    fn on_new_action(&self, trace: Uuid, action: &Action, result: &State);

    /// Batch commit, each action paired with its own result state.
    fn on_new_actions(&self, trace: Uuid, committed: &[(Action, Arc<State>)]) {
        for (action, result) in committed {
            self.on_new_action(trace, action, result);
        }
    }

    fn on_load_finished(&self, _model: &Model) {}

    /// Tab-separated report of what the feature collected.
    fn report(&self) -> String;
}
