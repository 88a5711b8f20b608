use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::model::{
    Model, Widget, WidgetId,
    identity::{WidgetKey, widget_identity},
};
use crate::storage::{
    Record,
    schema::{parse_flag, widget_fields as f},
};

/// Turns widget records into canonical, registry-held widgets.
pub struct WidgetParser {
    model: Arc<Model>,
}

impl WidgetParser {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    /// Identity computed from the structural fields of a record.
    pub fn identify(&self, record: &Record) -> WidgetId {
        widget_identity(&WidgetKey {
            class_name: record.field(f::CLASS),
            resource_id: record.field(f::RESOURCE_ID),
            package_name: record.field(f::PACKAGE),
            xpath: record.field(f::XPATH),
        })
    }

    /// Parse a standalone record. Parent references cannot be resolved
    /// outside a state, so the widget has none unless already registered.
    pub fn parse(&self, record: &Record) -> Arc<Widget> {
        self.parse_in_state(record, &HashMap::new())
    }

    /// Parse a record of a state file. `siblings` maps the stored ids of the
    /// same file to their computed identities and is used for the parent link.
    ///
    /// If the identity is already registered, the registered widget is
    /// returned and this instance is dropped.
    pub fn parse_in_state(&self, record: &Record, siblings: &HashMap<String, WidgetId>) -> Arc<Widget> {
        let id = self.identify(record);

        let stored = record.field(f::ID).trim();
        if !stored.is_empty() && stored != id.to_string() {
            debug!(stored, repaired = %id, "widget id repaired");
            self.model.alias_widget(stored, id);
        }

        let parent_raw = record.field(f::PARENT).trim();
        let parent_id = if parent_raw.is_empty() {
            None
        } else {
            siblings.get(parent_raw).copied().filter(|p| *p != id)
        };

        let widget = Widget {
            id,
            class_name: record.field(f::CLASS).to_string(),
            resource_id: record.field(f::RESOURCE_ID).to_string(),
            package_name: record.field(f::PACKAGE).to_string(),
            xpath: record.field(f::XPATH).to_string(),
            text: record.field(f::TEXT).to_string(),
            clickable: parse_flag(record.field(f::CLICKABLE)),
            long_clickable: parse_flag(record.field(f::LONG_CLICKABLE)),
            input_field: parse_flag(record.field(f::INPUT_FIELD)),
            scrollable: parse_flag(record.field(f::SCROLLABLE)),
            parent_id,
            bounds: record.field(f::BOUNDS).parse().unwrap_or_default(),
        };

        self.model.register_widget(widget)
    }

    /// Resolve a widget id as written in a trace record to its canonical id.
    /// `None` for an empty id, or when the widget was never registered under
    /// that id or as an alias of it.
    pub fn fixed_widget_id(&self, raw: &str) -> Option<WidgetId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(id) = raw.parse::<WidgetId>() {
            if self.model.widget(id).is_some() {
                return Some(id);
            }
        }
        self.model.widget_alias(raw)
    }
}
