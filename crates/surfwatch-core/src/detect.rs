//! Change detection: decides whether a snapshot carries a new external event.
//!
//! Detection runs in three phases so the caller can sleep between them:
//!
//! 1. [`Detector::assess`] compares the snapshot against the baseline
//!    without touching it and picks at most one candidate heuristic.
//! 2. [`Assessment::confirm`] (only when [`Assessment::needs_confirmation`])
//!    checks that the evidence persists in a second, slightly later snapshot.
//! 3. [`Detector::commit`] applies the burst fallback, writes the baseline
//!    and produces the [`DetectionVerdict`].
//!
//! # Heuristics (precedence order)
//!
//! - **cooling_down**: gate active → never an event; only the label is tracked.
//! - **self_authored_update**: newest item changed but was produced locally.
//! - **fingerprint_mismatch**: newest item changed and is external.
//! - **tail_novelty**: an external item in the last `tail_window` entries is
//!   not in the remembered history (several items arrived between polls).
//! - **unread_badge**: the surface label changed and now carries `(N)`/`[N]`.
//! - **burst_count**: nothing above fired, yet the item count grew by more
//!   than one and none of the appended entries is remembered (fingerprinting
//!   degraded but counting still works).

use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::baseline::{Baseline, DEFAULT_HISTORY_SIZE};
use crate::cooldown::CooldownGate;
use crate::error::CoreError;
use crate::origin::is_self_originated;
use crate::signature::{fingerprint_of, fingerprints_of, latest_of};
use crate::types::{Fingerprint, Snapshot};

/// Unread counter in a window title, e.g. `Chat (3)` or `Chat [12]`.
static UNREAD_BADGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d+\)|\[\d+\]").expect("valid unread badge pattern"));

// ─── Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Remembered fingerprints (default 5).
    pub history_size: usize,
    /// Trailing entries inspected for novelty (default 3).
    pub tail_window: usize,
    /// Candidates seen sooner than this after the previous poll are
    /// re-sampled before being confirmed (default 200).
    pub min_poll_interval_ms: u64,
    /// Delay before the confirmation re-sample (default 100).
    pub confirm_delay_ms: u64,
    /// Treat a new `(N)` counter in the surface label as an event.
    pub unread_badge: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            tail_window: 3,
            min_poll_interval_ms: 200,
            confirm_delay_ms: 100,
            unread_badge: true,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.history_size == 0 {
            return Err(CoreError::InvalidConfig("history_size must be >= 1".into()));
        }
        if self.tail_window == 0 || self.tail_window > self.history_size {
            return Err(CoreError::InvalidConfig(format!(
                "tail_window must be in 1..={}",
                self.history_size
            )));
        }
        Ok(())
    }
}

// ─── Verdict ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionReason {
    None,
    CoolingDown,
    SelfAuthoredUpdate,
    FingerprintMismatch,
    TailNovelty,
    UnreadBadge,
    BurstCount,
    /// A candidate failed its confirmation re-sample.
    Unconfirmed,
}

impl DetectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::CoolingDown => "cooling_down",
            Self::SelfAuthoredUpdate => "self_authored_update",
            Self::FingerprintMismatch => "fingerprint_mismatch",
            Self::TailNovelty => "tail_novelty",
            Self::UnreadBadge => "unread_badge",
            Self::BurstCount => "burst_count",
            Self::Unconfirmed => "unconfirmed",
        }
    }
}

impl std::fmt::Display for DetectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Confirmed,
    Rejected,
}

/// Diagnostic fields behind a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub previous_latest: Option<Fingerprint>,
    pub latest: Option<Fingerprint>,
    pub novel: Vec<Fingerprint>,
    pub previous_count: usize,
    pub current_count: usize,
    pub label: String,
    pub confirmation: Option<Confirmation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionVerdict {
    pub is_new_event: bool,
    pub reason: DetectionReason,
    pub evidence: Evidence,
}

impl DetectionVerdict {
    /// One-line summary for logs and status output.
    pub fn summary(&self) -> String {
        let ev = &self.evidence;
        let mut out = format!(
            "{} ({}) items {}->{}",
            if self.is_new_event { "NEW" } else { "no-op" },
            self.reason,
            ev.previous_count,
            ev.current_count
        );
        if ev.previous_latest != ev.latest {
            out.push_str(&format!(
                " latest {}->{}",
                fp_or_dash(ev.previous_latest.as_ref()),
                fp_or_dash(ev.latest.as_ref())
            ));
        }
        if !ev.novel.is_empty() {
            out.push_str(&format!(" novel={}", ev.novel.len()));
        }
        if let Some(c) = ev.confirmation {
            out.push_str(&format!(" confirmation={c:?}"));
        }
        out
    }
}

fn fp_or_dash(fp: Option<&Fingerprint>) -> &str {
    fp.map_or("-", Fingerprint::as_str)
}

// ─── Assessment ─────────────────────────────────────────────────────

/// Read-only result of comparing one snapshot with the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Decided without heuristics (cooling or empty snapshot).
    decided: Option<DetectionReason>,
    self_update: bool,
    candidate: Option<DetectionReason>,
    needs_confirmation: bool,
    confirmation: Option<Confirmation>,
    latest: Option<Fingerprint>,
    /// Per-entry fingerprints; `None` for unreadable entries.
    entry_fps: Vec<Option<Fingerprint>>,
    novel: Vec<Fingerprint>,
    label: String,
    previous_latest: Option<Fingerprint>,
    previous_count: usize,
}

impl Assessment {
    pub fn candidate(&self) -> Option<DetectionReason> {
        self.candidate
    }

    pub fn needs_confirmation(&self) -> bool {
        self.needs_confirmation && self.candidate.is_some()
    }

    /// Require the candidate's evidence to persist in `resample`.
    ///
    /// A missing re-sample (provider failure) rejects the candidate.
    pub fn confirm(&mut self, resample: Option<&Snapshot>) {
        let Some(reason) = self.candidate else {
            return;
        };
        let persisted = resample.is_some_and(|snap| match reason {
            DetectionReason::FingerprintMismatch => {
                let again = latest_of(&snap.items).map(fingerprint_of);
                again.is_some() && again == self.latest
            }
            DetectionReason::TailNovelty => {
                let again = fingerprints_of(&snap.items);
                self.novel.iter().any(|fp| again.contains(fp))
            }
            DetectionReason::UnreadBadge => snap.label == self.label,
            _ => true,
        });
        self.needs_confirmation = false;
        if persisted {
            self.confirmation = Some(Confirmation::Confirmed);
        } else {
            tracing::debug!("{reason} candidate did not persist in re-sample");
            self.confirmation = Some(Confirmation::Rejected);
            self.candidate = None;
        }
    }

    fn current_count(&self) -> usize {
        self.entry_fps.len()
    }

    fn fingerprints(&self) -> Vec<Fingerprint> {
        self.entry_fps.iter().flatten().cloned().collect()
    }
}

// ─── Detector ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn confirm_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.confirm_delay_ms)
    }

    /// Fresh baseline for this detector's history size.
    pub fn baseline(&self) -> Baseline {
        Baseline::new(self.config.history_size)
    }

    /// Phase 1: compare `snapshot` with `baseline`. Never mutates.
    ///
    /// `since_last_poll` is the time elapsed since the previous poll, if any.
    pub fn assess(
        &self,
        snapshot: &Snapshot,
        baseline: &Baseline,
        gate: &CooldownGate,
        since_last_poll: Option<TimeDelta>,
    ) -> Assessment {
        let entry_fps: Vec<Option<Fingerprint>> = snapshot
            .items
            .iter()
            .map(|entry| entry.as_ref().ok().map(fingerprint_of))
            .collect();

        let mut a = Assessment {
            decided: None,
            self_update: false,
            candidate: None,
            needs_confirmation: false,
            confirmation: None,
            latest: None,
            entry_fps,
            novel: Vec::new(),
            label: snapshot.label.clone(),
            previous_latest: baseline.latest_fingerprint.clone(),
            previous_count: baseline.item_count,
        };

        if gate.is_active() {
            a.decided = Some(DetectionReason::CoolingDown);
            return a;
        }
        if snapshot.is_empty() {
            a.decided = Some(DetectionReason::None);
            return a;
        }

        let surface = snapshot.surface_bounds.as_ref();

        // Newest item.
        let latest_item = latest_of(&snapshot.items);
        a.latest = a.entry_fps.last().cloned().flatten();
        if let (Some(item), Some(latest)) = (latest_item, a.latest.as_ref())
            && baseline.latest_fingerprint.as_ref() != Some(latest)
        {
            if is_self_originated(item, surface) {
                a.self_update = true;
            } else {
                a.candidate = Some(DetectionReason::FingerprintMismatch);
            }
        }

        // Tail window: external items not yet remembered.
        let readable: Vec<_> = snapshot
            .items
            .iter()
            .zip(&a.entry_fps)
            .filter_map(|(entry, fp)| Some((entry.as_ref().ok()?, fp.as_ref()?)))
            .collect();
        let tail_start = readable.len().saturating_sub(self.config.tail_window);
        a.novel = readable[tail_start..]
            .iter()
            .filter(|(item, fp)| {
                !baseline.recent_fingerprints.contains(fp) && !is_self_originated(item, surface)
            })
            .map(|(_, fp)| (*fp).clone())
            .collect();
        if a.candidate.is_none() && !a.novel.is_empty() {
            a.candidate = Some(DetectionReason::TailNovelty);
        }

        // Surface label.
        if a.candidate.is_none()
            && self.config.unread_badge
            && snapshot.label != baseline.surface_label
            && UNREAD_BADGE.is_match(&snapshot.label)
        {
            a.candidate = Some(DetectionReason::UnreadBadge);
        }

        let min_interval = TimeDelta::milliseconds(
            i64::try_from(self.config.min_poll_interval_ms).unwrap_or(i64::MAX),
        );
        a.needs_confirmation =
            a.candidate.is_some() && since_last_poll.is_some_and(|d| d < min_interval);
        a
    }

    /// Phase 3: finalize the verdict and write the baseline.
    pub fn commit(&self, a: Assessment, baseline: &mut Baseline) -> DetectionVerdict {
        let current_count = a.current_count();
        let mut evidence = Evidence {
            previous_latest: a.previous_latest.clone(),
            latest: a.latest.clone(),
            novel: a.novel.clone(),
            previous_count: a.previous_count,
            current_count,
            label: a.label.clone(),
            confirmation: a.confirmation,
        };

        match a.decided {
            Some(DetectionReason::CoolingDown) => {
                baseline.surface_label = a.label;
                // Evidence reflects the baseline, not the suppressed snapshot.
                evidence.latest = evidence.previous_latest.clone();
                evidence.current_count = evidence.previous_count;
                return verdict(false, DetectionReason::CoolingDown, evidence);
            }
            // Empty snapshot.
            Some(reason) => {
                baseline.item_count = 0;
                return verdict(false, reason, evidence);
            }
            None => {}
        }

        let (is_new_event, reason) = if let Some(reason) = a.candidate {
            (true, reason)
        } else if a.self_update {
            (false, DetectionReason::SelfAuthoredUpdate)
        } else if a.confirmation == Some(Confirmation::Rejected) {
            // A rejected re-sample rules out the burst fallback too.
            (false, DetectionReason::Unconfirmed)
        } else if self.is_burst(&a, baseline) {
            (true, DetectionReason::BurstCount)
        } else {
            (false, DetectionReason::None)
        };

        baseline.item_count = current_count;
        baseline.remember_tail(&a.fingerprints());
        baseline.surface_label = a.label;
        if (is_new_event || a.self_update)
            && let Some(latest) = a.latest
        {
            baseline.latest_fingerprint = Some(latest);
        }

        verdict(is_new_event, reason, evidence)
    }

    /// All three phases, with a synchronous re-sample callback.
    ///
    /// `resample` is only called when the assessment needs confirmation; it
    /// is responsible for waiting [`Self::confirm_delay`] itself.
    pub fn detect_with(
        &self,
        snapshot: &Snapshot,
        baseline: &mut Baseline,
        gate: &CooldownGate,
        since_last_poll: Option<TimeDelta>,
        resample: impl FnOnce() -> Option<Snapshot>,
    ) -> DetectionVerdict {
        let mut a = self.assess(snapshot, baseline, gate, since_last_poll);
        if a.needs_confirmation() {
            let again = resample();
            a.confirm(again.as_ref());
        }
        self.commit(a, baseline)
    }

    /// Detection without a confirmation re-sample.
    pub fn detect(
        &self,
        snapshot: &Snapshot,
        baseline: &mut Baseline,
        gate: &CooldownGate,
    ) -> DetectionVerdict {
        self.detect_with(snapshot, baseline, gate, None, || None)
    }

    /// Count grew by more than one and no appended entry is remembered.
    fn is_burst(&self, a: &Assessment, baseline: &Baseline) -> bool {
        let current = a.current_count();
        if current <= baseline.item_count.saturating_add(1) {
            return false;
        }
        let appended = current - baseline.item_count;
        !a.entry_fps[current - appended..]
            .iter()
            .flatten()
            .any(|fp| baseline.recent_fingerprints.contains(fp))
    }
}

fn verdict(is_new_event: bool, reason: DetectionReason, evidence: Evidence) -> DetectionVerdict {
    DetectionVerdict {
        is_new_event,
        reason,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bounds, ChildElement, ItemDescriptor};
    use chrono::{DateTime, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    fn window() -> Bounds {
        Bounds::new(0, 0, 1000, 800)
    }

    fn incoming(text: &str, row: i32) -> ItemDescriptor {
        ItemDescriptor {
            content: text.to_string(),
            type_tag: 50007,
            bounds: Some(Bounds::new(0, row * 40, 1000, row * 40 + 40)),
            children: vec![ChildElement {
                name: text.to_string(),
                class_name: "Bubble".to_string(),
                bounds: Some(Bounds::new(60, row * 40, 400, row * 40 + 40)),
            }],
            ..Default::default()
        }
    }

    fn outgoing(text: &str, row: i32) -> ItemDescriptor {
        let mut item = incoming(text, row);
        item.children[0].bounds = Some(Bounds::new(640, row * 40, 940, row * 40 + 40));
        item
    }

    fn snap(items: &[ItemDescriptor]) -> Snapshot {
        items
            .iter()
            .cloned()
            .fold(Snapshot::new("Chat", Some(window())), Snapshot::with_item)
    }

    fn detector() -> Detector {
        Detector::new(DetectorConfig::default()).expect("valid config")
    }

    fn idle() -> CooldownGate {
        CooldownGate::default()
    }

    #[test]
    fn config_validation() {
        assert!(DetectorConfig::default().validate().is_ok());
        let no_tail = DetectorConfig {
            tail_window: 0,
            ..Default::default()
        };
        assert!(Detector::new(no_tail).is_err());
        let tail_past_history = DetectorConfig {
            history_size: 2,
            tail_window: 3,
            ..Default::default()
        };
        assert!(Detector::new(tail_past_history).is_err());
    }

    #[test]
    fn first_external_item_is_mismatch() {
        let d = detector();
        let mut baseline = d.baseline();
        let v = d.detect(&snap(&[incoming("hi", 0)]), &mut baseline, &idle());

        assert!(v.is_new_event);
        assert_eq!(v.reason, DetectionReason::FingerprintMismatch);
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&incoming("hi", 0))));
        assert_eq!(baseline.item_count, 1);
    }

    #[test]
    fn unchanged_snapshot_is_noop() {
        let d = detector();
        let s = snap(&[incoming("a", 0), incoming("b", 1)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let v = d.detect(&s, &mut baseline, &idle());

        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::None);
        assert!(v.summary().starts_with("no-op (none)"));
    }

    #[test]
    fn self_authored_latest_updates_baseline_without_event() {
        let d = detector();
        let before = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&before, 5);
        let after = snap(&[incoming("a", 0), outgoing("sticker", 1)]);

        let v = d.detect(&after, &mut baseline, &idle());
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::SelfAuthoredUpdate);
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&outgoing("sticker", 1))));
    }

    #[test]
    fn tail_novelty_catches_item_behind_self_message() {
        // External message followed by our own within one poll interval:
        // the self-authored newest item must not mask the external one.
        let d = detector();
        let before = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&before, 5);
        let after = snap(&[incoming("a", 0), incoming("b", 1), outgoing("me", 2)]);

        let v = d.detect(&after, &mut baseline, &idle());
        assert!(v.is_new_event);
        assert_eq!(v.reason, DetectionReason::TailNovelty);
        assert_eq!(v.evidence.novel, vec![fingerprint_of(&incoming("b", 1))]);
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&outgoing("me", 2))));
    }

    #[test]
    fn self_authored_burst_is_not_an_event() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let after = snap(&[
            incoming("a", 0),
            outgoing("me 1", 1),
            outgoing("me 2", 2),
            outgoing("me 3", 3),
        ]);
        let v = d.detect(&after, &mut baseline, &idle());
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::SelfAuthoredUpdate);
        assert!(v.evidence.novel.is_empty());
    }

    #[test]
    fn tail_novelty_when_latest_unchanged() {
        let d = detector();
        let s = snap(&[incoming("a", 0), incoming("b", 1)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        // "a" edited in place; newest item untouched.
        let edited = snap(&[incoming("a (edited)", 0), incoming("b", 1)]);

        let v = d.detect(&edited, &mut baseline, &idle());
        assert!(v.is_new_event);
        assert_eq!(v.reason, DetectionReason::TailNovelty);
        assert_eq!(v.evidence.novel, vec![fingerprint_of(&incoming("a (edited)", 0))]);
    }

    #[test]
    fn mismatch_takes_precedence_over_tail_novelty() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let v = d.detect(
            &snap(&[incoming("a", 0), incoming("b", 1), incoming("c", 2)]),
            &mut baseline,
            &idle(),
        );
        assert_eq!(v.reason, DetectionReason::FingerprintMismatch);
        assert_eq!(v.evidence.novel.len(), 2);
    }

    #[test]
    fn cooling_gate_suppresses_everything() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let before = baseline.clone();
        let mut gate = idle();
        gate.begin(t0());

        let mut changed = snap(&[incoming("a", 0), incoming("b", 1), incoming("c", 2)]);
        changed.label = "Chat (2)".to_string();
        let v = d.detect(&changed, &mut baseline, &gate);

        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::CoolingDown);
        assert_eq!(baseline.latest_fingerprint, before.latest_fingerprint);
        assert_eq!(baseline.recent_fingerprints, before.recent_fingerprints);
        assert_eq!(baseline.item_count, before.item_count);
        assert_eq!(baseline.surface_label, "Chat (2)");
    }

    #[test]
    fn empty_snapshot_only_resets_count() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let before = baseline.clone();

        let v = d.detect(&Snapshot::new("", None), &mut baseline, &idle());
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::None);
        assert_eq!(baseline.item_count, 0);
        assert_eq!(baseline.latest_fingerprint, before.latest_fingerprint);
        assert_eq!(baseline.recent_fingerprints, before.recent_fingerprints);
        assert_eq!(baseline.surface_label, before.surface_label);
    }

    #[test]
    fn items_returning_after_empty_tick_do_not_burst() {
        let d = detector();
        let s = snap(&[incoming("a", 0), incoming("b", 1), incoming("c", 2)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        d.detect(&Snapshot::new("Chat", None), &mut baseline, &idle());

        let v = d.detect(&s, &mut baseline, &idle());
        assert!(!v.is_new_event);
        assert_eq!(baseline.item_count, 3);
    }

    #[test]
    fn burst_fires_when_fingerprints_unreadable() {
        let d = detector();
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let burst = s
            .clone()
            .with_unreadable("stale")
            .with_unreadable("stale")
            .with_unreadable("stale");

        let v = d.detect(&burst, &mut baseline, &idle());
        assert!(v.is_new_event);
        assert_eq!(v.reason, DetectionReason::BurstCount);
        assert_eq!(baseline.item_count, 4);
        // Newest entry unreadable: latest stays put.
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&incoming("a", 0))));
    }

    #[test]
    fn single_item_growth_is_not_burst() {
        let d = detector();
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let v = d.detect(&s.clone().with_unreadable("stale"), &mut baseline, &idle());
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::None);
    }

    #[test]
    fn unread_badge_in_label() {
        let d = detector();
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let mut badged = s.clone();
        badged.label = "Chat (1)".to_string();

        let v = d.detect(&badged, &mut baseline, &idle());
        assert!(v.is_new_event);
        assert_eq!(v.reason, DetectionReason::UnreadBadge);

        // Same label again: already bookkept.
        let v = d.detect(&badged, &mut baseline, &idle());
        assert!(!v.is_new_event);
    }

    #[test]
    fn unread_badge_can_be_disabled() {
        let d = Detector::new(DetectorConfig {
            unread_badge: false,
            ..Default::default()
        })
        .expect("valid");
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let mut badged = s.clone();
        badged.label = "Chat [4]".to_string();
        assert!(!d.detect(&badged, &mut baseline, &idle()).is_new_event);
        assert_eq!(baseline.surface_label, "Chat [4]");
    }

    #[test]
    fn label_without_counter_is_not_event() {
        let d = detector();
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let mut renamed = s.clone();
        renamed.label = "Other chat".to_string();
        assert!(!d.detect(&renamed, &mut baseline, &idle()).is_new_event);
    }

    #[test]
    fn fast_poll_requires_confirmation() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let s = snap(&[incoming("a", 0), incoming("b", 1)]);

        let fast = d.assess(&s, &baseline, &idle(), Some(TimeDelta::milliseconds(50)));
        assert!(fast.needs_confirmation());
        let slow = d.assess(&s, &baseline, &idle(), Some(TimeDelta::milliseconds(500)));
        assert!(!slow.needs_confirmation());
        let first = d.assess(&s, &baseline, &idle(), None);
        assert!(!first.needs_confirmation());

        let v = d.detect_with(&s, &mut baseline, &idle(), Some(TimeDelta::milliseconds(50)), || {
            Some(s.clone())
        });
        assert!(v.is_new_event);
        assert_eq!(v.evidence.confirmation, Some(Confirmation::Confirmed));
    }

    #[test]
    fn flicker_is_rejected_and_latest_kept() {
        let d = detector();
        let stable = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&stable, 5);
        let flicker = snap(&[incoming("a", 0), incoming("ghost", 1)]);

        let v = d.detect_with(
            &flicker,
            &mut baseline,
            &idle(),
            Some(TimeDelta::milliseconds(10)),
            || Some(stable.clone()),
        );
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::Unconfirmed);
        assert_eq!(v.evidence.confirmation, Some(Confirmation::Rejected));
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&incoming("a", 0))));
    }

    #[test]
    fn multi_item_flicker_is_not_a_burst() {
        let d = detector();
        let stable = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&stable, 5);
        let flicker = snap(&[
            incoming("a", 0),
            incoming("g1", 1),
            incoming("g2", 2),
            incoming("g3", 3),
        ]);

        let v = d.detect_with(
            &flicker,
            &mut baseline,
            &idle(),
            Some(TimeDelta::milliseconds(10)),
            || Some(stable.clone()),
        );
        assert!(!v.is_new_event);
        assert_eq!(v.reason, DetectionReason::Unconfirmed);
        assert_eq!(v.evidence.confirmation, Some(Confirmation::Rejected));
        assert_eq!(baseline.latest_fingerprint, Some(fingerprint_of(&incoming("a", 0))));
    }

    #[test]
    fn failed_resample_rejects() {
        let d = detector();
        let mut baseline = Baseline::from_snapshot(&snap(&[incoming("a", 0)]), 5);
        let s = snap(&[incoming("a", 0), incoming("b", 1)]);
        let v = d.detect_with(&s, &mut baseline, &idle(), Some(TimeDelta::zero()), || None);
        assert_eq!(v.reason, DetectionReason::Unconfirmed);
    }

    #[test]
    fn resample_not_called_without_candidate() {
        let d = detector();
        let s = snap(&[incoming("a", 0)]);
        let mut baseline = Baseline::from_snapshot(&s, 5);
        let v = d.detect_with(&s, &mut baseline, &idle(), Some(TimeDelta::zero()), || {
            panic!("no candidate, no re-sample")
        });
        assert!(!v.is_new_event);
    }

    #[test]
    fn reason_tags_serialize_snake_case() {
        let json = serde_json::to_string(&DetectionReason::SelfAuthoredUpdate).expect("serialize");
        assert_eq!(json, "\"self_authored_update\"");
        assert_eq!(DetectionReason::BurstCount.to_string(), "burst_count");
    }
}
