//! Positional field layout shared by the trace/state writers and the loader.
//! Indices must stay stable across versions; only trailing fields may be added.

/// Layout of a record file: its header names and how many leading fields a
/// line must carry to be accepted.
#[derive(Debug, Clone, Copy)]
pub struct RecordSchema {
    pub name: &'static str,
    pub header: &'static [&'static str],
    pub min_fields: usize,
}

impl RecordSchema {
    pub fn field_count(&self) -> usize {
        self.header.len()
    }

    pub fn header_line(&self, separator: char) -> String {
        self.header.join(&separator.to_string())
    }
}

pub mod trace_fields {
    pub const ACTION: usize = 0;
    pub const SRC_STATE: usize = 1;
    pub const RES_STATE: usize = 2;
    pub const WIDGET: usize = 3;
    pub const DATA: usize = 4;
    pub const START_MS: usize = 5;
    pub const END_MS: usize = 6;
    pub const SUCCESS: usize = 7;
    pub const EXCEPTION: usize = 8;
    pub const DEVICE_LOGS: usize = 9;
}

pub mod widget_fields {
    pub const ID: usize = 0;
    pub const CLASS: usize = 1;
    pub const RESOURCE_ID: usize = 2;
    pub const PACKAGE: usize = 3;
    pub const XPATH: usize = 4;
    pub const TEXT: usize = 5;
    pub const CLICKABLE: usize = 6;
    pub const LONG_CLICKABLE: usize = 7;
    pub const INPUT_FIELD: usize = 8;
    pub const SCROLLABLE: usize = 9;
    pub const PARENT: usize = 10;
    pub const BOUNDS: usize = 11;
}

pub const TRACE_SCHEMA: RecordSchema = RecordSchema {
    name: "trace",
    header: &[
        "Action",
        "SourceState",
        "ResultState",
        "TargetWidget",
        "Data",
        "StartTime",
        "EndTime",
        "Successful",
        "Exception",
        "DeviceLogs",
    ],
    min_fields: 4,
};

pub const WIDGET_SCHEMA: RecordSchema = RecordSchema {
    name: "widget",
    header: &[
        "Id",
        "Class",
        "ResourceId",
        "Package",
        "XPath",
        "Text",
        "Clickable",
        "LongClickable",
        "InputField",
        "Scrollable",
        "Parent",
        "Bounds",
    ],
    min_fields: 12,
};

/// Pre-parent widget layout, accepted in compatibility mode.
pub const LEGACY_WIDGET_SCHEMA: RecordSchema = RecordSchema {
    name: "widget (legacy)",
    header: &[
        "Id",
        "Class",
        "ResourceId",
        "Package",
        "XPath",
        "Text",
        "Clickable",
        "LongClickable",
        "InputField",
        "Scrollable",
        "Parent",
        "Bounds",
    ],
    min_fields: 10,
};

pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "true" | "True" | "TRUE" | "1")
}
