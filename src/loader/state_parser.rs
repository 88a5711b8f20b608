use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::model::{Model, State, StateId};
use crate::storage::{ContentReader, Record, RecordSchema, schema::widget_fields};

use super::{config::ModelConfig, error::LoaderError, widget_parser::WidgetParser};

type StateCell = Arc<OnceCell<Arc<State>>>;

/// Loads state records and merges them into the state registry.
///
/// Parses are keyed by the raw id found in trace records, so concurrent
/// requests for the same state file share one parse.
pub struct StateParser {
    model: Arc<Model>,
    widget_parser: Arc<WidgetParser>,
    reader: ContentReader,
    schema: RecordSchema,
    config: Arc<ModelConfig>,
    pending: Mutex<HashMap<String, StateCell>>,
}

impl StateParser {
    pub fn new(model: Arc<Model>, widget_parser: Arc<WidgetParser>, config: Arc<ModelConfig>) -> Self {
        let parser = Self {
            reader: config.reader(),
            schema: config.widget_schema(),
            model,
            widget_parser,
            config,
            pending: Mutex::new(HashMap::new()),
        };
        parser.seed_empty_state();
        parser
    }

    fn seed_empty_state(&self) {
        let empty = self.model.empty_state();
        self.pending.lock().insert(
            StateId::EMPTY.to_string(),
            Arc::new(OnceCell::new_with(Some(empty))),
        );
    }

    /// Canonical state for a raw id, loading its record file on first request.
    pub async fn resolve(&self, raw_id: &str) -> Result<Arc<State>, LoaderError> {
        let raw_id = raw_id.trim();
        let cell = self
            .pending
            .lock()
            .entry(raw_id.to_string())
            .or_default()
            .clone();

        cell.get_or_try_init(|| self.load(raw_id))
            .await
            .cloned()
    }

    /// A state already parsed under `raw_id`, without triggering a load.
    pub fn settled(&self, raw_id: &str) -> Option<Arc<State>> {
        let cell = self.pending.lock().get(raw_id.trim()).cloned();
        cell.and_then(|c| c.get().cloned())
            .or_else(|| self.model.state_by_raw(raw_id.trim()))
    }

    async fn load(&self, raw_id: &str) -> Result<Arc<State>, LoaderError> {
        if let Some(state) = self.model.state_by_raw(raw_id) {
            return Ok(state);
        }

        let path = self.config.state_path(raw_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(LoaderError::MissingStateRecord {
                raw_id: raw_id.to_string(),
                path,
            });
        }

        let records = self.reader.read_all(&path, self.schema).await?;
        let state = self.parse(&records);
        if state.id.to_string() != raw_id {
            info!(stored = raw_id, repaired = %state.id, "state id repaired");
            self.model.alias_state(raw_id, state.id);
        }
        Ok(state)
    }

    /// Build the canonical state for the widget records of one state file.
    /// An empty record set yields the seeded empty state.
    pub fn parse(&self, records: &[Record]) -> Arc<State> {
        if records.is_empty() {
            return self.model.empty_state();
        }

        // identities first, so parent links can point at any row of the file
        let siblings: HashMap<String, _> = records
            .iter()
            .map(|r| (r.field(widget_fields::ID).trim().to_string(), self.widget_parser.identify(r)))
            .filter(|(stored, _)| !stored.is_empty())
            .collect();

        let widgets = records
            .iter()
            .map(|r| self.widget_parser.parse_in_state(r, &siblings))
            .collect();

        let state = self.model.register_state(State::new(widgets));
        debug!(state = %state.id, widgets = state.widgets.len(), "state parsed");
        state
    }

    /// Drop the parse cache; the registry keeps every canonical state.
    pub fn clear(&self) {
        self.pending.lock().clear();
        self.seed_empty_state();
    }
}
