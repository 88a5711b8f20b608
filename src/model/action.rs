use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::identity::{StateId, WidgetId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionType {
    Click,
    LongClick,
    TextInsert,
    Swipe,
    PressBack,
    PressHome,
    LaunchApp,
    Terminate,
    FetchState,
    Other(String),
}

impl ActionType {
    /// Global actions never carry a target widget.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            ActionType::PressBack
                | ActionType::PressHome
                | ActionType::LaunchApp
                | ActionType::Terminate
                | ActionType::FetchState
        )
    }

    pub fn is_click(&self) -> bool {
        matches!(self, ActionType::Click | ActionType::LongClick)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Click => "Click",
            ActionType::LongClick => "LongClick",
            ActionType::TextInsert => "TextInsert",
            ActionType::Swipe => "Swipe",
            ActionType::PressBack => "PressBack",
            ActionType::PressHome => "PressHome",
            ActionType::LaunchApp => "LaunchApp",
            ActionType::Terminate => "Terminate",
            ActionType::FetchState => "FetchState",
            ActionType::Other(name) => name,
        };
        f.write_str(name)
    }
}

impl FromStr for ActionType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Click" => ActionType::Click,
            "LongClick" => ActionType::LongClick,
            "TextInsert" => ActionType::TextInsert,
            "Swipe" => ActionType::Swipe,
            "PressBack" => ActionType::PressBack,
            "PressHome" => ActionType::PressHome,
            "LaunchApp" => ActionType::LaunchApp,
            "Terminate" => ActionType::Terminate,
            "FetchState" => ActionType::FetchState,
            other => ActionType::Other(other.to_string()),
        })
    }
}

/// One committed interaction of a trace, carrying canonical identities only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Position of the record within its trace file.
    pub index: usize,
    pub action_type: ActionType,
    pub src_state: StateId,
    pub res_state: StateId,
    pub target_widget: Option<WidgetId>,

    pub data: String,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub successful: bool,
    pub exception: String,
    pub device_logs: Vec<String>,
}
