use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use super::identity::{WidgetId, WidgetKey, widget_identity};

/// Screen rectangle of a widget, in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Bounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 4 {
            return Err(format!("expected x:y:w:h, got '{}'", s));
        }
        let num = |p: &str| p.trim().parse::<i32>().map_err(|e| format!("{}: {}", p, e));
        Ok(Bounds {
            x: num(parts[0])?,
            y: num(parts[1])?,
            width: num(parts[2])?,
            height: num(parts[3])?,
        })
    }
}

/// Canonical UI element. Equality and hashing use `id` only.
#[derive(Debug, Clone)]
pub struct Widget {
    pub id: WidgetId,
    pub class_name: String,
    pub resource_id: String,
    pub package_name: String,
    pub xpath: String,
    pub text: String,

    pub clickable: bool,
    pub long_clickable: bool,
    pub input_field: bool,
    pub scrollable: bool,

    /// Parent inside the same state, never an owning edge.
    pub parent_id: Option<WidgetId>,
    pub bounds: Bounds,
}

impl Widget {
    pub fn key(&self) -> WidgetKey<'_> {
        WidgetKey {
            class_name: &self.class_name,
            resource_id: &self.resource_id,
            package_name: &self.package_name,
            xpath: &self.xpath,
        }
    }

    /// Recompute the identity from the structural fields.
    pub fn computed_id(&self) -> WidgetId {
        widget_identity(&self.key())
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Widget {}

impl Hash for Widget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
