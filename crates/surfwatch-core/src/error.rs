//! Error types for the detection core.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid cooldown {0}: must be a finite, non-negative number of seconds")]
    InvalidCooldown(f64),

    #[error("invalid detector config: {0}")]
    InvalidConfig(String),
}
