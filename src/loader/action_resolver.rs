use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::model::{Action, ActionType, State, WidgetId};
use crate::storage::{Record, schema::trace_fields as f};

use super::{error::LoaderError, state_parser::StateParser, widget_parser::WidgetParser};

/// Non-fatal findings while resolving a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionNote {
    /// The target widget id is not registered, not even as an alias.
    UnknownWidget { raw_id: String },
    /// The target widget exists but not in the action's source state.
    WidgetNotInSource { widget: WidgetId },
    /// Some ids of the record were rewritten to their canonical form.
    IdsRepaired { original: Record, repaired: Record },
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub action: Action,
    pub result_state: Arc<State>,
    pub notes: Vec<ResolutionNote>,
}

pub struct ActionResolver {
    widget_parser: Arc<WidgetParser>,
    state_parser: Arc<StateParser>,
}

impl ActionResolver {
    pub fn new(widget_parser: Arc<WidgetParser>, state_parser: Arc<StateParser>) -> Self {
        Self {
            widget_parser,
            state_parser,
        }
    }

    /// Resolve one trace record whose result state was already loaded.
    ///
    /// Fails only when the source state is unknown. A target widget that
    /// cannot be found is dropped from the action and reported as a note.
    /// Global actions never keep a target.
    pub fn resolve(
        &self,
        index: usize,
        record: &Record,
        result_state: Arc<State>,
    ) -> Result<Resolution, LoaderError> {
        let mut notes = Vec::new();

        let action_type: ActionType = record
            .field(f::ACTION)
            .parse()
            .unwrap_or(ActionType::Other(String::new()));

        let mut raw_widget = record.field(f::WIDGET).trim();
        if action_type.is_global() && !raw_widget.is_empty() {
            debug!(action = %action_type, widget = raw_widget, line = record.line, "target of global action dropped");
            raw_widget = "";
        }
        let target_id = self.widget_parser.fixed_widget_id(raw_widget);
        if target_id.is_none() && !raw_widget.is_empty() {
            warn!(widget = raw_widget, line = record.line, "target widget cannot be resolved");
            notes.push(ResolutionNote::UnknownWidget {
                raw_id: raw_widget.to_string(),
            });
        }

        let raw_src = record.field(f::SRC_STATE).trim();
        let src_state = self
            .state_parser
            .settled(raw_src)
            .ok_or_else(|| LoaderError::UnresolvedState {
                raw_id: raw_src.to_string(),
                line: record.line,
            })?;

        let target_widget = target_id.and_then(|id| {
            if src_state.contains(id) {
                Some(id)
            } else {
                warn!(widget = %id, state = %src_state.id, line = record.line, "target widget cannot be found in source state");
                notes.push(ResolutionNote::WidgetNotInSource { widget: id });
                None
            }
        });

        let mut repaired = record.clone();
        repaired.set_field(f::RES_STATE, result_state.id.to_string());
        repaired.set_field(f::SRC_STATE, src_state.id.to_string());
        match target_widget {
            Some(id) => repaired.set_field(f::WIDGET, id.to_string()),
            None if raw_widget.is_empty() => repaired.set_field(f::WIDGET, ""),
            None => {}
        }
        if has_id_divergence(record, &repaired) {
            info!(
                line = record.line,
                original = ?record.fields,
                repaired = ?repaired.fields,
                "record ids changed by automatic repair"
            );
            notes.push(ResolutionNote::IdsRepaired {
                original: record.clone(),
                repaired: repaired.clone(),
            });
        }

        let action = Action {
            index,
            action_type,
            src_state: src_state.id,
            res_state: result_state.id,
            target_widget,
            data: repaired.field(f::DATA).to_string(),
            start_ms: repaired.field(f::START_MS).trim().parse().ok(),
            end_ms: repaired.field(f::END_MS).trim().parse().ok(),
            successful: parse_success(repaired.field(f::SUCCESS)),
            exception: repaired.field(f::EXCEPTION).to_string(),
            device_logs: parse_logs(repaired.field(f::DEVICE_LOGS)),
        };

        Ok(Resolution {
            action,
            result_state,
            notes,
        })
    }
}

fn has_id_divergence(original: &Record, repaired: &Record) -> bool {
    [f::SRC_STATE, f::RES_STATE, f::WIDGET]
        .into_iter()
        .any(|idx| original.field(idx).trim() != repaired.field(idx))
}

// A missing success column predates failure tracking; such records succeeded.
fn parse_success(raw: &str) -> bool {
    match raw.trim() {
        "" => true,
        other => crate::storage::schema::parse_flag(other),
    }
}

fn parse_logs(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return vec![];
    }
    serde_json::from_str(raw).unwrap_or_else(|_| vec![raw.to_string()])
}
