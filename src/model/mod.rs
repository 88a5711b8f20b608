pub mod action;
pub mod error;
pub mod graph;
pub mod identity;
pub mod state;
pub mod trace;
pub mod widget;

pub use action::{Action, ActionType};
pub use error::ModelError;
pub use graph::Model;
pub use identity::{StateId, WidgetId};
pub use state::State;
pub use trace::{Trace, TraceHandle};
pub use widget::{Bounds, Widget};
