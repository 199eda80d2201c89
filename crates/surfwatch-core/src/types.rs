use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Geometry ─────────────────────────────────────────────────────

/// Screen-space rectangle in pixels, as reported by the UI tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Horizontal midpoint: `left + width / 2`.
    pub fn mid_x(&self) -> i32 {
        self.left.saturating_add(self.width() / 2)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

// ─── Item descriptors ─────────────────────────────────────────────

/// An immediate child of an observed item (bubble, avatar, text run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildElement {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

/// One observed item at poll time.
///
/// Produced fresh on every snapshot, even for items that did not change;
/// never carried across polls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    #[serde(default)]
    pub content: String,
    /// Structural control-type tag of the element.
    #[serde(default)]
    pub type_tag: i64,
    #[serde(default)]
    pub automation_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub children: Vec<ChildElement>,
}

/// Why a snapshot entry's fields could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReadError {
    pub index: usize,
    pub detail: String,
}

impl fmt::Display for ItemReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {} unreadable: {}", self.index, self.detail)
    }
}

impl std::error::Error for ItemReadError {}

/// One entry of a snapshot: readable item or a per-item read failure.
pub type SnapshotEntry = Result<ItemDescriptor, ItemReadError>;

// ─── Snapshot ─────────────────────────────────────────────────────

/// One poll's read of the observed surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Surface-level label (window title).
    pub label: String,
    /// Geometry of the observed surface, if known.
    pub surface_bounds: Option<Bounds>,
    /// Ordered item entries, oldest first.
    pub items: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, surface_bounds: Option<Bounds>) -> Self {
        Self {
            label: label.into(),
            surface_bounds,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemDescriptor) -> Self {
        self.items.push(Ok(item));
        self
    }

    #[must_use]
    pub fn with_unreadable(mut self, detail: impl Into<String>) -> Self {
        let index = self.items.len();
        self.items.push(Err(ItemReadError {
            index,
            detail: detail.into(),
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ─── Fingerprint ──────────────────────────────────────────────────

/// Short deterministic digest identifying one item across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_midpoint() {
        let b = Bounds::new(100, 0, 900, 600);
        assert_eq!(b.width(), 800);
        assert_eq!(b.height(), 600);
        assert_eq!(b.mid_x(), 500);
    }

    #[test]
    fn snapshot_builder_indexes_unreadable_entries() {
        let snap = Snapshot::new("Chat", None)
            .with_item(ItemDescriptor::default())
            .with_unreadable("stale element");
        assert_eq!(snap.len(), 2);
        let err = snap.items[1].as_ref().expect_err("unreadable");
        assert_eq!(err.index, 1);
        assert_eq!(err.to_string(), "item 1 unreadable: stale element");
    }

    #[test]
    fn item_descriptor_deserializes_with_defaults() {
        let item: ItemDescriptor =
            serde_json::from_str(r#"{"content":"hi"}"#).expect("deserialize");
        assert_eq!(item.content, "hi");
        assert_eq!(item.type_tag, 0);
        assert!(item.bounds.is_none());
        assert!(item.children.is_empty());
    }

    #[test]
    fn fingerprint_serializes_as_plain_string() {
        let fp = Fingerprint::from("abc123def456".to_string());
        let json = serde_json::to_string(&fp).expect("serialize");
        assert_eq!(json, "\"abc123def456\"");
    }
}
