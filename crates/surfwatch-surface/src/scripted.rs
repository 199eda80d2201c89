//! In-memory collaborators for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use surfwatch_core::Snapshot;

use crate::error::SurfaceError;
use crate::provider::{ActionDispatcher, SurfaceProvider};

/// Surface double fed from a queue of scripted results.
///
/// When the queue drains, the last successful snapshot is repeated (an
/// empty snapshot if there never was one).
#[derive(Debug)]
pub struct ScriptedSurface {
    queue: Mutex<VecDeque<Result<Snapshot, String>>>,
    last: Mutex<Option<Snapshot>>,
    alive: AtomicBool,
    calls: AtomicUsize,
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            alive: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let surface = Self::new();
        for snap in snapshots {
            surface.push(snap);
        }
        surface
    }

    pub fn push(&self, snapshot: Snapshot) {
        lock(&self.queue).push_back(Ok(snapshot));
    }

    /// Queue a transient provider failure.
    pub fn push_failure(&self, detail: impl Into<String>) {
        lock(&self.queue).push_back(Err(detail.into()));
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// Number of `snapshot()` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl SurfaceProvider for ScriptedSurface {
    fn snapshot(&self) -> Result<Snapshot, SurfaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.queue).pop_front();
        match next {
            Some(Ok(snap)) => {
                *lock(&self.last) = Some(snap.clone());
                Ok(snap)
            }
            Some(Err(detail)) => Err(SurfaceError::Unavailable(detail)),
            None => Ok(lock(&self.last).clone().unwrap_or_default()),
        }
    }

    fn surface_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Dispatcher double that counts invocations and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let d = Self::default();
        d.set_failing(true);
        d
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn perform_action(&self) -> Result<(), SurfaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SurfaceError::Unavailable("scripted dispatch failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use surfwatch_core::ItemDescriptor;

    use super::*;

    fn snap(label: &str) -> Snapshot {
        Snapshot::new(label, None).with_item(ItemDescriptor {
            content: label.to_string(),
            ..ItemDescriptor::default()
        })
    }

    #[test]
    fn drains_queue_then_repeats_last() {
        let surface = ScriptedSurface::from_snapshots([snap("a"), snap("b")]);
        surface.push_failure("flaky");

        assert_eq!(surface.snapshot().expect("a").label, "a");
        assert_eq!(surface.snapshot().expect("b").label, "b");
        assert!(surface.snapshot().is_err());
        assert_eq!(surface.snapshot().expect("repeat").label, "b");
        assert_eq!(surface.calls(), 4);
        assert_eq!(surface.pending(), 0);
    }

    #[test]
    fn empty_script_yields_empty_snapshot() {
        let surface = ScriptedSurface::new();
        assert!(surface.snapshot().expect("empty").is_empty());
        assert!(surface.surface_alive());
        surface.set_alive(false);
        assert!(!surface.surface_alive());
    }

    #[test]
    fn recording_dispatcher_counts_and_fails() {
        let d = RecordingDispatcher::new();
        d.perform_action().expect("ok");
        d.set_failing(true);
        assert!(d.perform_action().is_err());
        assert_eq!(d.calls(), 2);
        assert!(RecordingDispatcher::failing().perform_action().is_err());
    }
}
