#![allow(dead_code)]

use std::{fs, path::PathBuf};

use explore_model::loader::ModelConfig;
use explore_model::model::{
    StateId, WidgetId,
    identity::{WidgetKey, state_identity, widget_identity},
};
use tempfile::TempDir;
use uuid::Uuid;

pub const APP: &str = "com.example.app";

/// A widget row as it appears in a state file.
#[derive(Debug, Clone)]
pub struct FixtureWidget {
    pub id: WidgetId,
    pub stored_id: String,
    pub class: String,
    pub resource_id: String,
    pub package: String,
    pub xpath: String,
    pub text: String,
    pub clickable: bool,
    pub parent: String,
}

impl FixtureWidget {
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_stored_id(mut self, stored: &str) -> Self {
        self.stored_id = stored.to_string();
        self
    }

    pub fn child_of(mut self, parent: &FixtureWidget) -> Self {
        self.parent = parent.stored_id.clone();
        self
    }

    pub fn row(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};false;false;false;{};0:0:100:50",
            self.stored_id,
            self.class,
            self.resource_id,
            self.package,
            self.xpath,
            self.text,
            self.clickable,
            self.parent
        )
    }

    /// Row in the pre-parent layout (10 fields).
    pub fn legacy_row(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};false;false;false",
            self.stored_id, self.class, self.resource_id, self.package, self.xpath, self.text, self.clickable
        )
    }
}

pub fn widget(resource_id: &str, xpath: &str) -> FixtureWidget {
    let class = "android.widget.Button";
    let id = widget_identity(&WidgetKey {
        class_name: class,
        resource_id,
        package_name: APP,
        xpath,
    });
    FixtureWidget {
        id,
        stored_id: id.to_string(),
        class: class.to_string(),
        resource_id: resource_id.to_string(),
        package: APP.to_string(),
        xpath: xpath.to_string(),
        text: String::new(),
        clickable: true,
        parent: String::new(),
    }
}

pub fn state_id_of(widgets: &[&FixtureWidget]) -> StateId {
    let ids: Vec<WidgetId> = widgets.iter().map(|w| w.id).collect();
    state_identity(ids.iter())
}

pub fn empty_id() -> String {
    StateId::EMPTY.to_string()
}

/// Temporary `<output>/model/<app>` directory with trace and state files.
pub struct ModelDir {
    pub tmp: TempDir,
    pub base_dir: PathBuf,
}

impl ModelDir {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let base_dir = tmp.path().join("model").join("app");
        fs::create_dir_all(base_dir.join("states")).expect("states dir");
        Self { tmp, base_dir }
    }

    pub fn config(&self) -> ModelConfig {
        ModelConfig::new(&self.base_dir)
    }

    /// Write a state file named after the canonical id; returns that id.
    pub fn state(&self, widgets: &[&FixtureWidget]) -> String {
        let id = state_id_of(widgets).to_string();
        self.state_as(&id, widgets);
        id
    }

    /// Write a state file under an arbitrary (possibly stale) name.
    pub fn state_as(&self, raw_id: &str, widgets: &[&FixtureWidget]) {
        let mut content = String::from(
            "Id;Class;ResourceId;Package;XPath;Text;Clickable;LongClickable;InputField;Scrollable;Parent;Bounds\n",
        );
        for w in widgets {
            content.push_str(&w.row());
            content.push('\n');
        }
        self.write(&format!("states/{}.csv", raw_id), &content);
    }

    pub fn raw_state(&self, raw_id: &str, content: &str) {
        self.write(&format!("states/{}.csv", raw_id), content);
    }

    /// Write a trace file; returns its id.
    pub fn trace(&self, lines: &[String]) -> Uuid {
        let id = Uuid::new_v4();
        self.trace_with_id(id, lines);
        id
    }

    pub fn trace_with_id(&self, id: Uuid, lines: &[String]) {
        let mut content = String::from(
            "Action;SourceState;ResultState;TargetWidget;Data;StartTime;EndTime;Successful;Exception;DeviceLogs\n",
        );
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        self.write(&format!("trace{}.csv", id), &content);
    }

    pub fn write(&self, relative: &str, content: &str) {
        fs::write(self.base_dir.join(relative), content).expect("write fixture");
    }
}

pub fn action(kind: &str, src: &str, res: &str, widget: &str) -> String {
    format!("{};{};{};{};;1000;1200;true;;[]", kind, src, res, widget)
}

pub fn action_with_logs(kind: &str, src: &str, res: &str, widget: &str, logs: &[&str]) -> String {
    let logs = serde_json::to_string(logs).expect("logs json");
    format!("{};{};{};{};;1000;1200;true;;{}", kind, src, res, widget, logs)
}

/// Three states chained from the empty state: empty -> home -> list -> detail.
/// Returns the directory, the trace id and the ids of home, list and detail.
pub fn linear_app() -> (ModelDir, Uuid, Vec<String>) {
    let dir = ModelDir::new();
    let open = widget("open", "/0/1");
    let item = widget("item", "/0/2");
    let back = widget("back", "/0/3");

    let home = dir.state(&[&open]);
    let list = dir.state(&[&item, &back]);
    let detail = dir.state(&[&back]);

    let trace = dir.trace(&[
        action("LaunchApp", &empty_id(), &home, ""),
        action("Click", &home, &list, &open.stored_id),
        action("Click", &list, &detail, &item.stored_id),
    ]);
    (dir, trace, vec![home, list, detail])
}
