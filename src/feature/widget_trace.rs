use std::{fmt::Write, sync::Arc};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::{Action, Model, State, StateId, Widget, WidgetId};

use super::ModelFeature;

struct ClickRecord {
    trace: Uuid,
    index: usize,
    src_state: StateId,
    widget: Option<WidgetId>,
    device_logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTraceRow {
    pub trace: Uuid,
    pub index: usize,
    pub text: String,
    pub widget: Option<WidgetId>,
    pub log: String,
}

/// Lists the device logs produced by every click together with a readable
/// label of the clicked widget.
#[derive(Default)]
pub struct WidgetTextTrace {
    clicks: Mutex<Vec<ClickRecord>>,
    rows: Mutex<Vec<WidgetTraceRow>>,
}

impl WidgetTextTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<WidgetTraceRow> {
        self.rows.lock().clone()
    }
}

impl ModelFeature for WidgetTextTrace {
    fn name(&self) -> &str {
        "widgetTextTrace"
    }

    fn on_new_action(&self, trace: Uuid, action: &Action, _result: &State) {
        if !action.action_type.is_click() {
            return;
        }
        self.clicks.lock().push(ClickRecord {
            trace,
            index: action.index,
            src_state: action.src_state,
            widget: action.target_widget,
            device_logs: action.device_logs.clone(),
        });
    }

    fn on_load_finished(&self, model: &Model) {
        let clicks = std::mem::take(&mut *self.clicks.lock());
        let mut rows = Vec::new();
        for click in clicks {
            let text = click
                .widget
                .and_then(|id| model.state(click.src_state).zip(model.widget(id)))
                .map(|(state, widget)| labelled_widget(&widget, &state).text.clone())
                .unwrap_or_default();

            let logs = if click.device_logs.is_empty() {
                vec![String::new()]
            } else {
                click.device_logs
            };
            for log in logs {
                rows.push(WidgetTraceRow {
                    trace: click.trace,
                    index: click.index,
                    text: text.clone(),
                    widget: click.widget,
                    log,
                });
            }
        }
        rows.sort_by(|a, b| (a.trace, a.index).cmp(&(b.trace, b.index)));
        *self.rows.lock() = rows;
    }

    fn report(&self) -> String {
        let mut out = String::from("trace\tactionNr\ttext\twidget\tlog\n");
        for row in self.rows.lock().iter() {
            let widget = row.widget.map(|w| w.to_string()).unwrap_or_default();
            let _ = writeln!(out, "{}\t{}\t{}\t{}\t{}", row.trace, row.index, row.text, widget, row.log);
        }
        out
    }
}

/// The widget itself when it has text; otherwise its only text-bearing child,
/// descending through single-child chains.
pub fn labelled_widget(widget: &Arc<Widget>, state: &State) -> Arc<Widget> {
    // parent links come from recorded data and may form cycles
    descend(widget, state, state.widgets.len())
}

fn descend(widget: &Arc<Widget>, state: &State, budget: usize) -> Arc<Widget> {
    if !widget.text.is_empty() || budget == 0 {
        return widget.clone();
    }
    let children = state.children_of(widget.id);
    if children.is_empty() {
        return widget.clone();
    }

    let with_text: Vec<_> = children.iter().filter(|c| !c.text.is_empty()).collect();
    match (with_text.len(), children.len()) {
        (1, _) => (*with_text[0]).clone(),
        (_, 1) => descend(children[0], state, budget - 1),
        _ => widget.clone(),
    }
}
