//! Error types for the surface IO boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("surface unavailable: {0}")]
    Unavailable(String),

    #[error("invalid fixture {path}: {detail}")]
    Fixture { path: String, detail: String },

    #[error("action not calibrated: {0}")]
    NotCalibrated(String),

    #[error("surface io error: {0}")]
    Io(#[from] std::io::Error),
}
