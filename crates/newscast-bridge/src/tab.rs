use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a browser tab.
///
/// Only ever compared for equality: it tells whether a persisted snapshot
/// belongs to the tab currently in focus. It carries no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

impl From<u64> for TabId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
