use std::sync::{Arc, Mutex};

use explore_model::feature::{ActionTypeCount, ModelFeature};
use explore_model::model::{
    Action, ActionType, Bounds, Model, ModelError, State, StateId, Widget, WidgetId,
    identity::{WidgetKey, state_identity, widget_identity},
};
use uuid::Uuid;

// ============================================================================
// Helper builders
// ============================================================================

fn make_widget(resource_id: &str, text: &str) -> Widget {
    let key = WidgetKey {
        class_name: "android.widget.TextView",
        resource_id,
        package_name: "com.example.app",
        xpath: "/0/0",
    };
    Widget {
        id: widget_identity(&key),
        class_name: key.class_name.into(),
        resource_id: resource_id.into(),
        package_name: key.package_name.into(),
        xpath: key.xpath.into(),
        text: text.into(),
        clickable: true,
        long_clickable: false,
        input_field: false,
        scrollable: false,
        parent_id: None,
        bounds: Bounds::default(),
    }
}

fn make_action(index: usize, src: StateId, res: StateId, target: Option<WidgetId>) -> Action {
    Action {
        index,
        action_type: if target.is_some() { ActionType::Click } else { ActionType::PressBack },
        src_state: src,
        res_state: res,
        target_widget: target,
        data: String::new(),
        start_ms: None,
        end_ms: None,
        successful: true,
        exception: String::new(),
        device_logs: vec![],
    }
}

/// Model with one registered state holding one widget.
fn model_with_state() -> (Model, Arc<State>) {
    let model = Model::new();
    let widget = model.register_widget(make_widget("ok", "OK"));
    let state = model.register_state(State::new(vec![widget]));
    (model, state)
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn widget_identity_ignores_text() {
    let a = make_widget("title", "Hello");
    let b = make_widget("title", "Goodbye");
    assert_eq!(a.id, b.id, "Text is not part of the identity");
    assert_eq!(a, b, "Equality follows the identity");
    assert_eq!(a.computed_id(), a.id);
}

#[test]
fn widget_identity_changes_with_structure() {
    let a = make_widget("title", "");
    let b = make_widget("subtitle", "");
    assert_ne!(a.id, b.id);
}

#[test]
fn state_identity_is_order_independent() {
    let a = make_widget("a", "").id;
    let b = make_widget("b", "").id;
    let c = make_widget("c", "").id;

    assert_eq!(state_identity([a, b, c].iter()), state_identity([c, a, b].iter()));
    assert_eq!(
        state_identity([a, b].iter()),
        state_identity([b, a, b].iter()),
        "Duplicates collapse"
    );
    assert_ne!(state_identity([a, b].iter()), state_identity([a, c].iter()));
}

#[test]
fn empty_widget_set_maps_to_empty_state_id() {
    let none: [WidgetId; 0] = [];
    assert_eq!(state_identity(none.iter()), StateId::EMPTY);
    assert!(State::new(vec![]).is_empty_state());
    assert!(State::empty().is_empty_state());
}

#[test]
fn ids_round_trip_through_strings() {
    let id = make_widget("x", "").id;
    let parsed: WidgetId = id.to_string().parse().expect("uuid string");
    assert_eq!(parsed, id);
    assert!("not-an-id".parse::<StateId>().is_err());
}

#[test]
fn state_dedupes_widgets_and_detects_launcher() {
    let w = Arc::new(make_widget("x", ""));
    let state = State::new(vec![w.clone(), w.clone()]);
    assert_eq!(state.widgets.len(), 1);
    assert!(!state.is_home_screen);

    let mut launcher = make_widget("x", "");
    launcher.package_name = "com.android.launcher3".into();
    let home = State::new(vec![Arc::new(launcher)]);
    assert!(home.is_home_screen);
}

#[test]
fn bounds_parse_and_display() {
    let b: Bounds = "10:20:300:40".parse().expect("bounds");
    assert_eq!(b, Bounds { x: 10, y: 20, width: 300, height: 40 });
    assert_eq!(b.to_string(), "10:20:300:40");
    assert!("1:2:3".parse::<Bounds>().is_err());
}

#[test]
fn action_type_parses_known_and_custom_names() {
    assert_eq!("Click".parse::<ActionType>(), Ok(ActionType::Click));
    assert_eq!("PressBack".parse::<ActionType>(), Ok(ActionType::PressBack));
    assert_eq!(
        "Rotate".parse::<ActionType>(),
        Ok(ActionType::Other("Rotate".into()))
    );
    assert!(ActionType::PressBack.is_global());
    assert!(!ActionType::Click.is_global());
    assert_eq!(ActionType::Other("Rotate".into()).to_string(), "Rotate");
}

// ============================================================================
// Registries
// ============================================================================

#[test]
fn new_model_contains_only_empty_state() {
    let model = Model::new();
    assert_eq!(model.state_count(), 1);
    assert!(model.state(StateId::EMPTY).is_some());
    assert_eq!(model.widget_count(), 0);
    assert_eq!(model.trace_count(), 0);
}

#[test]
fn first_registered_widget_wins() {
    let model = Model::new();
    let first = model.register_widget(make_widget("title", "first"));
    let second = model.register_widget(make_widget("title", "second"));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.text, "first");
    assert_eq!(model.widget_count(), 1);
}

#[test]
fn registering_empty_state_returns_seeded_instance() {
    let model = Model::new();
    let seeded = model.empty_state();
    let again = model.register_state(State::new(vec![]));
    assert!(Arc::ptr_eq(&seeded, &again));
}

#[test]
fn state_lookup_by_raw_id_uses_aliases() {
    let (model, state) = model_with_state();
    assert!(model.state_by_raw(&state.id.to_string()).is_some());
    assert!(model.state_by_raw("legacy-42").is_none());

    model.alias_state("legacy-42", state.id);
    let found = model.state_by_raw("legacy-42").expect("aliased");
    assert!(Arc::ptr_eq(&found, &state));
}

// ============================================================================
// Traces
// ============================================================================

#[test]
fn duplicate_trace_id_is_rejected() {
    let model = Model::new();
    let id = Uuid::new_v4();
    model.init_new_trace(id).expect("first");
    assert_eq!(model.init_new_trace(id), Err(ModelError::DuplicateTrace(id)));
}

#[test]
fn append_requires_registered_states_and_source_widget() {
    let (model, state) = model_with_state();
    let handle = model.init_new_trace(Uuid::new_v4()).expect("trace");
    let unknown = StateId::from_uuid(Uuid::new_v4());

    let err = model
        .append(&handle, make_action(0, StateId::EMPTY, unknown, None))
        .unwrap_err();
    assert!(matches!(err, ModelError::DanglingState { .. }));

    // the widget lives in `state`, not in the empty source state
    let target = state.widgets[0].id;
    let err = model
        .append(&handle, make_action(0, StateId::EMPTY, state.id, Some(target)))
        .unwrap_err();
    assert!(matches!(err, ModelError::DanglingWidget { .. }));

    model
        .append(&handle, make_action(0, StateId::EMPTY, state.id, None))
        .expect("valid action");
    model
        .append(&handle, make_action(1, state.id, state.id, Some(target)))
        .expect("valid click");
    assert_eq!(model.trace(handle.id).expect("trace").len(), 2);
}

#[test]
fn append_rejects_out_of_order_index() {
    let (model, state) = model_with_state();
    let handle = model.init_new_trace(Uuid::new_v4()).expect("trace");
    model
        .append(&handle, make_action(3, StateId::EMPTY, state.id, None))
        .expect("first");
    let err = model
        .append(&handle, make_action(3, state.id, state.id, None))
        .unwrap_err();
    assert!(matches!(err, ModelError::OutOfOrder { last: 3, index: 3, .. }));
}

#[test]
fn append_all_is_all_or_nothing() {
    let (model, state) = model_with_state();
    let handle = model.init_new_trace(Uuid::new_v4()).expect("trace");
    let bad = StateId::from_uuid(Uuid::new_v4());

    let err = model.append_all(
        &handle,
        vec![
            make_action(0, StateId::EMPTY, state.id, None),
            make_action(1, state.id, bad, None),
        ],
    );
    assert!(err.is_err());
    assert!(model.trace(handle.id).expect("trace").is_empty(), "Nothing committed");

    let count = model
        .append_all(
            &handle,
            vec![
                make_action(0, StateId::EMPTY, state.id, None),
                make_action(1, state.id, state.id, None),
            ],
        )
        .expect("valid batch");
    assert_eq!(count, 2);
    assert_eq!(model.action_count(), 2);
}

#[test]
fn watchers_see_single_and_batch_commits() {
    let counter = Arc::new(ActionTypeCount::new());
    let watchers: Vec<Arc<dyn ModelFeature>> = vec![counter.clone()];
    let model = Model::with_watchers(watchers);
    let widget = model.register_widget(make_widget("ok", "OK"));
    let state = model.register_state(State::new(vec![widget.clone()]));
    let handle = model.init_new_trace(Uuid::new_v4()).expect("trace");

    model
        .append(&handle, make_action(0, StateId::EMPTY, state.id, None))
        .expect("single");
    model
        .append_all(
            &handle,
            vec![
                make_action(1, state.id, state.id, Some(widget.id)),
                make_action(2, state.id, state.id, Some(widget.id)),
            ],
        )
        .expect("batch");

    assert_eq!(counter.count(&ActionType::PressBack), 1);
    assert_eq!(counter.count(&ActionType::Click), 2);
    assert_eq!(counter.total(), 3);
    assert!(counter.report().starts_with("action\tcount\n"));
}

/// Records the result state handed over with every action.
#[derive(Default)]
struct ResultRecorder {
    seen: Mutex<Vec<(usize, StateId)>>,
}

impl ModelFeature for ResultRecorder {
    fn name(&self) -> &str {
        "resultRecorder"
    }

    fn on_new_action(&self, _trace: Uuid, action: &Action, result: &State) {
        self.seen.lock().unwrap().push((action.index, result.id));
    }

    fn report(&self) -> String {
        String::new()
    }
}

#[test]
fn batch_commit_pairs_each_action_with_its_result() {
    let recorder = Arc::new(ResultRecorder::default());
    let watchers: Vec<Arc<dyn ModelFeature>> = vec![recorder.clone()];
    let model = Model::with_watchers(watchers);
    let first = model.register_state(State::new(vec![model.register_widget(make_widget("a", ""))]));
    let second = model.register_state(State::new(vec![model.register_widget(make_widget("b", ""))]));
    let handle = model.init_new_trace(Uuid::new_v4()).expect("trace");

    model
        .append_all(
            &handle,
            vec![
                make_action(0, StateId::EMPTY, first.id, None),
                make_action(1, first.id, second.id, None),
                make_action(2, second.id, StateId::EMPTY, None),
            ],
        )
        .expect("batch");

    assert_eq!(
        *recorder.seen.lock().unwrap(),
        vec![(0, first.id), (1, second.id), (2, StateId::EMPTY)]
    );
}
