use std::{
    collections::HashSet,
    hash::{Hash, Hasher},
    sync::Arc,
};

use super::identity::{StateId, WidgetId, state_identity};
use super::widget::Widget;

const LAUNCHER_MARKER: &str = "launcher";

/// Canonical UI snapshot: the deduplicated set of widgets on screen.
#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    pub widgets: Vec<Arc<Widget>>,
    pub is_home_screen: bool,
}

impl State {
    /// Build a state from widgets in observation order. Repeated ids keep the first sighting.
    pub fn new(widgets: Vec<Arc<Widget>>) -> Self {
        let mut seen = HashSet::new();
        let widgets: Vec<Arc<Widget>> = widgets
            .into_iter()
            .filter(|w| seen.insert(w.id))
            .collect();

        let id = state_identity(widgets.iter().map(|w| &w.id));
        let is_home_screen = widgets
            .iter()
            .any(|w| w.package_name.to_lowercase().contains(LAUNCHER_MARKER));

        State {
            id,
            widgets,
            is_home_screen,
        }
    }

    pub fn empty() -> Self {
        State {
            id: StateId::EMPTY,
            widgets: vec![],
            is_home_screen: false,
        }
    }

    pub fn is_empty_state(&self) -> bool {
        self.id == StateId::EMPTY
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Arc<Widget>> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widget(id).is_some()
    }

    /// Widgets whose parent back-reference points at `parent`.
    pub fn children_of(&self, parent: WidgetId) -> Vec<&Arc<Widget>> {
        self.widgets
            .iter()
            .filter(|w| w.parent_id == Some(parent))
            .collect()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
