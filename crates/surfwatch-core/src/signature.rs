//! Signature extraction: item descriptor → short stable fingerprint.
//!
//! A fingerprint is the first [`FINGERPRINT_BYTES`] bytes of the SHA-256
//! digest of `content|type_tag|automation_id|geometry`, hex encoded.
//! Content includes up to [`MAX_CHILD_TEXTS`] non-empty child names, since
//! message text usually lives in child elements rather than on the item.

use sha2::{Digest, Sha256};

use crate::types::{Fingerprint, ItemDescriptor, SnapshotEntry};

/// Digest bytes kept per fingerprint (12 hex characters).
pub const FINGERPRINT_BYTES: usize = 6;

/// Child names folded into the content part of the fingerprint.
pub const MAX_CHILD_TEXTS: usize = 10;

/// Fingerprint of a single item. Pure: identical fields give identical output.
pub fn fingerprint_of(item: &ItemDescriptor) -> Fingerprint {
    let geometry = item.bounds.map(|b| b.to_string()).unwrap_or_default();
    let data = format!(
        "{}|{}|{}|{}",
        content_text(item),
        item.type_tag,
        item.automation_id,
        geometry
    );
    let digest = Sha256::digest(data.as_bytes());
    Fingerprint::from(hex::encode(&digest[..FINGERPRINT_BYTES]))
}

/// Fingerprints of every readable entry, in snapshot order.
///
/// Unreadable entries are skipped; a partial read never fails the tick.
pub fn fingerprints_of(entries: &[SnapshotEntry]) -> Vec<Fingerprint> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Ok(item) => Some(fingerprint_of(item)),
            Err(e) => {
                tracing::debug!("skipping entry during extraction: {e}");
                None
            }
        })
        .collect()
}

/// The newest item, if the last entry is readable.
pub fn latest_of(entries: &[SnapshotEntry]) -> Option<&ItemDescriptor> {
    entries.last().and_then(|entry| entry.as_ref().ok())
}

/// Item content joined with the first non-empty child names.
fn content_text(item: &ItemDescriptor) -> String {
    let mut parts = vec![item.content.trim()];
    parts.extend(
        item.children
            .iter()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .take(MAX_CHILD_TEXTS),
    );
    parts.join("|")
}
