//! Replays snapshots from a JSON fixture file.
//!
//! Fixture layout: `{"frames": [SnapshotFrame, ...]}`. Each `snapshot()`
//! advances one frame; after the last frame the provider keeps returning it.

use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use surfwatch_core::Snapshot;

use crate::error::SurfaceError;
use crate::frame::SnapshotFrame;
use crate::provider::SurfaceProvider;

#[derive(Debug, Deserialize)]
struct Fixture {
    frames: Vec<SnapshotFrame>,
}

#[derive(Debug)]
pub struct ReplaySurface {
    frames: Vec<SnapshotFrame>,
    cursor: Mutex<usize>,
}

impl ReplaySurface {
    pub fn from_frames(frames: Vec<SnapshotFrame>) -> Result<Self, SurfaceError> {
        if frames.is_empty() {
            return Err(SurfaceError::Fixture {
                path: "<memory>".to_string(),
                detail: "no frames".to_string(),
            });
        }
        Ok(Self {
            frames,
            cursor: Mutex::new(0),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SurfaceError> {
        let fixture_err = |detail: String| SurfaceError::Fixture {
            path: path.display().to_string(),
            detail,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let fixture: Fixture =
            serde_json::from_str(&raw).map_err(|e| fixture_err(e.to_string()))?;
        if fixture.frames.is_empty() {
            return Err(fixture_err("no frames".to_string()));
        }
        tracing::info!(path = %path.display(), frames = fixture.frames.len(), "replay fixture loaded");
        Self::from_frames(fixture.frames)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame the next `snapshot()` will return.
    pub fn position(&self) -> usize {
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current(&self) -> &SnapshotFrame {
        let idx = self.position().min(self.frames.len() - 1);
        &self.frames[idx]
    }
}

impl SurfaceProvider for ReplaySurface {
    fn snapshot(&self) -> Result<Snapshot, SurfaceError> {
        let frame = {
            let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
            let idx = (*cursor).min(self.frames.len() - 1);
            if *cursor < self.frames.len() {
                *cursor += 1;
            }
            &self.frames[idx]
        };
        frame.to_snapshot()
    }

    /// Liveness of the frame the next snapshot would return.
    fn surface_alive(&self) -> bool {
        self.current().alive
    }
}
