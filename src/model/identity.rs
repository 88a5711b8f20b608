use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use uuid::Uuid;

macro_rules! identity_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

identity_type!(WidgetId);
identity_type!(StateId);

impl StateId {
    /// Identity of the widget-less placeholder state every trace starts from.
    pub const EMPTY: StateId = StateId(Uuid::from_bytes(EMPTY_SET_DIGEST));
}

// First 16 bytes of SHA-1 over the empty input.
const EMPTY_SET_DIGEST: [u8; 16] = [
    0xda, 0x39, 0xa3, 0xee, 0x5e, 0x6b, 0x4b, 0x0d, 0x32, 0x55, 0xbf, 0xef, 0x95, 0x60, 0x18, 0x90,
];

/// Structural inputs of a widget identity. Text is deliberately absent.
#[derive(Debug, Clone, Copy)]
pub struct WidgetKey<'a> {
    pub class_name: &'a str,
    pub resource_id: &'a str,
    pub package_name: &'a str,
    pub xpath: &'a str,
}

pub fn widget_identity(key: &WidgetKey<'_>) -> WidgetId {
    let mut hasher = Sha1::new();
    for part in [key.class_name, key.resource_id, key.package_name, key.xpath] {
        hasher.update(part.as_bytes());
        hasher.update([0x1fu8]);
    }
    WidgetId(digest_to_uuid(&hasher.finalize()))
}

/// Set fingerprint: the entry order of `widgets` does not matter and duplicates collapse.
pub fn state_identity<'a>(widgets: impl IntoIterator<Item = &'a WidgetId>) -> StateId {
    let sorted: BTreeSet<&WidgetId> = widgets.into_iter().collect();
    let mut hasher = Sha1::new();
    for id in sorted {
        hasher.update(id.0.as_bytes());
    }
    StateId(digest_to_uuid(&hasher.finalize()))
}

fn digest_to_uuid(digest: &[u8]) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}
