//! Baseline: the detector's remembered view of the surface.

use std::collections::VecDeque;

use serde::Serialize;

use crate::signature::{fingerprint_of, fingerprints_of, latest_of};
use crate::types::{Fingerprint, Snapshot};

/// Default number of remembered fingerprints.
pub const DEFAULT_HISTORY_SIZE: usize = 5;

/// Bounded, insertion-ordered fingerprint history. Oldest evicted first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintHistory {
    capacity: usize,
    entries: VecDeque<Fingerprint>,
}

impl FingerprintHistory {
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Push `fp` unless already remembered, evicting the oldest on overflow.
    pub fn remember(&mut self, fp: &Fingerprint) {
        if self.contains(fp) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(fp.clone());
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.entries.contains(fp)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Fingerprint> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Baseline {
    pub latest_fingerprint: Option<Fingerprint>,
    pub recent_fingerprints: FingerprintHistory,
    pub item_count: usize,
    pub surface_label: String,
}

impl Baseline {
    pub fn new(history_size: usize) -> Self {
        Self {
            latest_fingerprint: None,
            recent_fingerprints: FingerprintHistory::new(history_size),
            item_count: 0,
            surface_label: String::new(),
        }
    }

    /// Build a baseline straight from a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot, history_size: usize) -> Self {
        let mut baseline = Self::new(history_size);
        baseline.resync(snapshot);
        baseline
    }

    /// Discard everything remembered and re-read it from `snapshot`.
    pub fn resync(&mut self, snapshot: &Snapshot) {
        self.latest_fingerprint = latest_of(&snapshot.items).map(fingerprint_of);
        self.recent_fingerprints.clear();
        self.remember_tail(&fingerprints_of(&snapshot.items));
        self.item_count = snapshot.len();
        self.surface_label.clone_from(&snapshot.label);
    }

    /// Remember the last `capacity` fingerprints of `fps`, in order.
    pub fn remember_tail(&mut self, fps: &[Fingerprint]) {
        let start = fps.len().saturating_sub(self.recent_fingerprints.capacity());
        for fp in &fps[start..] {
            self.recent_fingerprints.remember(fp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemDescriptor;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::from(s.to_string())
    }

    fn msg(content: &str) -> ItemDescriptor {
        ItemDescriptor {
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn history_evicts_oldest() {
        let mut h = FingerprintHistory::new(3);
        for s in ["a", "b", "c", "d"] {
            h.remember(&fp(s));
        }
        assert_eq!(h.to_vec(), vec![fp("b"), fp("c"), fp("d")]);
    }

    #[test]
    fn history_ignores_duplicates() {
        let mut h = FingerprintHistory::new(3);
        h.remember(&fp("a"));
        h.remember(&fp("a"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut h = FingerprintHistory::new(0);
        h.remember(&fp("a"));
        h.remember(&fp("b"));
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.to_vec(), vec![fp("b")]);
    }

    #[test]
    fn resync_reads_snapshot() {
        let mut snap = Snapshot::new("Chat (2)", None);
        for i in 0..7 {
            snap = snap.with_item(msg(&format!("m{i}")));
        }
        let baseline = Baseline::from_snapshot(&snap, 5);

        assert_eq!(baseline.item_count, 7);
        assert_eq!(baseline.surface_label, "Chat (2)");
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&msg("m6"))));
        let expected: Vec<_> = (2..7).map(|i| fingerprint_of(&msg(&format!("m{i}")))).collect();
        assert_eq!(baseline.recent_fingerprints.to_vec(), expected);
    }

    #[test]
    fn resync_discards_previous_history() {
        let first = Snapshot::new("A", None).with_item(msg("old"));
        let mut baseline = Baseline::from_snapshot(&first, 5);
        let second = Snapshot::new("B", None).with_item(msg("new"));
        baseline.resync(&second);

        assert_eq!(baseline.recent_fingerprints.to_vec(), vec![fingerprint_of(&msg("new"))]);
        assert_eq!(baseline.surface_label, "B");
    }

    #[test]
    fn resync_on_empty_snapshot_clears_latest() {
        let first = Snapshot::new("A", None).with_item(msg("old"));
        let mut baseline = Baseline::from_snapshot(&first, 5);
        baseline.resync(&Snapshot::new("A", None));

        assert!(baseline.latest_fingerprint.is_none());
        assert!(baseline.recent_fingerprints.is_empty());
        assert_eq!(baseline.item_count, 0);
    }
}
