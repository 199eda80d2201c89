//! JSON wire format shared by the probe command and replay fixtures.
//!
//! ```json
//! {
//!   "label": "Chat (1)",
//!   "bounds": {"left": 0, "top": 0, "right": 1000, "bottom": 800},
//!   "alive": true,
//!   "items": [
//!     {"content": "hi", "type_tag": 50007, "children": [{"name": "hi", "class_name": "Bubble"}]},
//!     {"unreadable": "element no longer available"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use surfwatch_core::types::{ItemReadError, SnapshotEntry};
use surfwatch_core::{Bounds, ItemDescriptor, Snapshot};

use crate::error::SurfaceError;

/// One snapshot as emitted by a probe or stored in a fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFrame {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default = "default_alive")]
    pub alive: bool,
    /// Simulated provider failure (fixtures only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub items: Vec<FrameEntry>,
}

fn default_alive() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameEntry {
    Unreadable { unreadable: String },
    Item(ItemDescriptor),
}

impl SnapshotFrame {
    pub fn parse(json: &str) -> Result<Self, SurfaceError> {
        Ok(serde_json::from_str(json.trim())?)
    }

    /// Convert into a core snapshot, or the simulated failure.
    pub fn to_snapshot(&self) -> Result<Snapshot, SurfaceError> {
        if let Some(ref err) = self.error {
            return Err(SurfaceError::Unavailable(err.clone()));
        }
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(index, entry)| -> SnapshotEntry {
                match entry {
                    FrameEntry::Item(item) => Ok(item.clone()),
                    FrameEntry::Unreadable { unreadable } => Err(ItemReadError {
                        index,
                        detail: unreadable.clone(),
                    }),
                }
            })
            .collect();
        Ok(Snapshot {
            label: self.label.clone(),
            surface_bounds: self.bounds,
            items,
        })
    }
}
