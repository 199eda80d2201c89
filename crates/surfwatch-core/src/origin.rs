//! Origin classification: was this item produced by the local actor?
//!
//! Heuristics, first positive match wins:
//!
//! 1. **Marker**: the item's or an immediate child's class name contains
//!    one of [`SELF_CLASS_MARKERS`].
//! 2. **Geometry**: the item's or an immediate child's left edge lies right
//!    of the surface's horizontal midpoint (outgoing bubbles are right-aligned).
//!
//! Anything else is external. Missing geometry never implies self-origin.

use crate::types::{Bounds, ItemDescriptor};

/// Lowercase class-name fragments that mark outgoing items.
pub const SELF_CLASS_MARKERS: &[&str] = &["self", "right"];

/// True if the item was most likely produced by the system itself.
pub fn is_self_originated(item: &ItemDescriptor, surface: Option<&Bounds>) -> bool {
    has_self_marker(item) || is_right_aligned(item, surface)
}

fn has_self_marker(item: &ItemDescriptor) -> bool {
    std::iter::once(item.class_name.as_str())
        .chain(item.children.iter().map(|c| c.class_name.as_str()))
        .any(class_marks_self)
}

fn class_marks_self(class_name: &str) -> bool {
    let lower = class_name.to_ascii_lowercase();
    SELF_CLASS_MARKERS.iter().any(|m| lower.contains(m))
}

fn is_right_aligned(item: &ItemDescriptor, surface: Option<&Bounds>) -> bool {
    let Some(surface) = surface else {
        return false;
    };
    if surface.width() <= 0 {
        return false;
    }
    let mid = surface.mid_x();
    std::iter::once(item.bounds)
        .chain(item.children.iter().map(|c| c.bounds))
        .flatten()
        .any(|b| b.left > mid)
}
