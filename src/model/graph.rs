use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::feature::ModelFeature;

use super::{
    action::Action,
    error::ModelError,
    identity::{StateId, WidgetId},
    state::State,
    trace::{Trace, TraceHandle},
    widget::Widget,
};

#[derive(Default)]
struct Registry {
    widgets: HashMap<WidgetId, Arc<Widget>>,
    widget_aliases: HashMap<String, WidgetId>,
    states: HashMap<StateId, Arc<State>>,
    state_aliases: HashMap<String, StateId>,
    traces: Vec<Trace>,
}

impl Registry {
    fn validate(&self, trace: &Trace, prev: Option<usize>, action: &Action) -> Result<(), ModelError> {
        trace.check_order(prev, action)?;
        let src = self.states.get(&action.src_state).ok_or(ModelError::DanglingState {
            trace: trace.id,
            index: action.index,
            state: action.src_state,
        })?;
        if !self.states.contains_key(&action.res_state) {
            return Err(ModelError::DanglingState {
                trace: trace.id,
                index: action.index,
                state: action.res_state,
            });
        }
        if let Some(widget) = action.target_widget {
            if !self.widgets.contains_key(&widget) || !src.contains(widget) {
                return Err(ModelError::DanglingWidget {
                    trace: trace.id,
                    index: action.index,
                    widget,
                });
            }
        }
        Ok(())
    }
}

/// Exploration graph: canonical widgets and states plus the recorded traces.
///
/// Every mutation goes through a single lock. Registration follows
/// first-committer-wins: a second instance with a known id is dropped and the
/// registered one is returned.
pub struct Model {
    registry: Mutex<Registry>,
    watchers: Vec<Arc<dyn ModelFeature>>,
}

impl Model {
    /// Create a model containing only the canonical empty state.
    pub fn new() -> Self {
        Self::with_watchers(Vec::new())
    }

    pub fn with_watchers(watchers: Vec<Arc<dyn ModelFeature>>) -> Self {
        let mut registry = Registry::default();
        registry
            .states
            .insert(StateId::EMPTY, Arc::new(State::empty()));
        Self {
            registry: Mutex::new(registry),
            watchers,
        }
    }

    pub fn watchers(&self) -> &[Arc<dyn ModelFeature>] {
        &self.watchers
    }

    pub fn has_watchers(&self) -> bool {
        !self.watchers.is_empty()
    }

    // ------------------------------------------------------------------
    // Widget registry
    // ------------------------------------------------------------------

    pub fn register_widget(&self, widget: Widget) -> Arc<Widget> {
        let mut registry = self.registry.lock();
        registry
            .widgets
            .entry(widget.id)
            .or_insert_with(|| Arc::new(widget))
            .clone()
    }

    pub fn widget(&self, id: WidgetId) -> Option<Arc<Widget>> {
        self.registry.lock().widgets.get(&id).cloned()
    }

    /// Record that a stored (legacy or stale) id denotes `id`.
    pub fn alias_widget(&self, raw: &str, id: WidgetId) {
        let mut registry = self.registry.lock();
        registry.widget_aliases.entry(raw.to_string()).or_insert(id);
    }

    pub fn widget_alias(&self, raw: &str) -> Option<WidgetId> {
        self.registry.lock().widget_aliases.get(raw).copied()
    }

    // ------------------------------------------------------------------
    // State registry
    // ------------------------------------------------------------------

    pub fn register_state(&self, state: State) -> Arc<State> {
        let mut registry = self.registry.lock();
        registry
            .states
            .entry(state.id)
            .or_insert_with(|| Arc::new(state))
            .clone()
    }

    pub fn state(&self, id: StateId) -> Option<Arc<State>> {
        self.registry.lock().states.get(&id).cloned()
    }

    pub fn empty_state(&self) -> Arc<State> {
        self.registry
            .lock()
            .states
            .entry(StateId::EMPTY)
            .or_insert_with(|| Arc::new(State::empty()))
            .clone()
    }

    pub fn alias_state(&self, raw: &str, id: StateId) {
        let mut registry = self.registry.lock();
        registry.state_aliases.entry(raw.to_string()).or_insert(id);
    }

    /// Look up a state by the id string found in a record: canonical ids first, then aliases.
    pub fn state_by_raw(&self, raw: &str) -> Option<Arc<State>> {
        let registry = self.registry.lock();
        let id = match raw.parse::<StateId>() {
            Ok(id) if registry.states.contains_key(&id) => id,
            _ => *registry.state_aliases.get(raw)?,
        };
        registry.states.get(&id).cloned()
    }

    // ------------------------------------------------------------------
    // Traces
    // ------------------------------------------------------------------

    pub fn init_new_trace(&self, id: Uuid) -> Result<TraceHandle, ModelError> {
        let mut registry = self.registry.lock();
        if registry.traces.iter().any(|t| t.id == id) {
            return Err(ModelError::DuplicateTrace(id));
        }
        registry.traces.push(Trace::new(id));
        debug!(trace = %id, "initialised trace");
        Ok(TraceHandle {
            slot: registry.traces.len() - 1,
            id,
        })
    }

    /// Commit one action and notify watchers action-by-action.
    pub fn append(&self, handle: &TraceHandle, action: Action) -> Result<(), ModelError> {
        let result = {
            let mut registry = self.registry.lock();
            let trace = registry
                .traces
                .get(handle.slot)
                .filter(|t| t.id == handle.id)
                .ok_or(ModelError::UnknownTrace(handle.id))?;
            registry.validate(trace, None, &action)?;
            let result = registry.states.get(&action.res_state).cloned();
            registry.traces[handle.slot].push(action.clone());
            result
        };

        if let Some(result) = result {
            for watcher in &self.watchers {
                watcher.on_new_action(handle.id, &action, &result);
            }
        }
        Ok(())
    }

    /// Commit a whole batch. The batch is validated first and either fully
    /// committed or rejected.
    pub fn append_all(&self, handle: &TraceHandle, actions: Vec<Action>) -> Result<usize, ModelError> {
        if actions.is_empty() {
            return Ok(0);
        }
        let committed: Vec<(Action, Arc<State>)> = {
            let mut registry = self.registry.lock();
            let trace = registry
                .traces
                .get(handle.slot)
                .filter(|t| t.id == handle.id)
                .ok_or(ModelError::UnknownTrace(handle.id))?;

            let mut prev = None;
            for action in &actions {
                registry.validate(trace, prev, action)?;
                prev = Some(action.index);
            }

            // validated above, every result state is registered
            let committed = actions
                .iter()
                .filter_map(|a| {
                    let result = registry.states.get(&a.res_state)?.clone();
                    Some((a.clone(), result))
                })
                .collect();
            registry.traces[handle.slot].extend(actions);
            committed
        };
        debug!(trace = %handle.id, count = committed.len(), "committed action batch");

        for watcher in &self.watchers {
            watcher.on_new_actions(handle.id, &committed);
        }
        Ok(committed.len())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn trace(&self, id: Uuid) -> Option<Trace> {
        self.registry
            .lock()
            .traces
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn traces(&self) -> Vec<Trace> {
        self.registry.lock().traces.clone()
    }

    pub fn states(&self) -> Vec<Arc<State>> {
        let mut states: Vec<_> = self.registry.lock().states.values().cloned().collect();
        states.sort_by_key(|s| s.id);
        states
    }

    pub fn widgets(&self) -> Vec<Arc<Widget>> {
        let mut widgets: Vec<_> = self.registry.lock().widgets.values().cloned().collect();
        widgets.sort_by_key(|w| w.id);
        widgets
    }

    pub fn state_ids(&self) -> BTreeSet<StateId> {
        self.registry.lock().states.keys().copied().collect()
    }

    pub fn widget_ids(&self) -> BTreeSet<WidgetId> {
        self.registry.lock().widgets.keys().copied().collect()
    }

    pub fn state_count(&self) -> usize {
        self.registry.lock().states.len()
    }

    pub fn widget_count(&self) -> usize {
        self.registry.lock().widgets.len()
    }

    pub fn trace_count(&self) -> usize {
        self.registry.lock().traces.len()
    }

    pub fn action_count(&self) -> usize {
        self.registry.lock().traces.iter().map(Trace::len).sum()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("Model")
            .field("states", &registry.states.len())
            .field("widgets", &registry.widgets.len())
            .field("traces", &registry.traces.len())
            .field("watchers", &self.watchers.len())
            .finish()
    }
}
