//! Status snapshot published by the poll loop.

use std::fmt;

use serde::Serialize;
use surfwatch_core::DetectionVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    SurfaceClosed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CooldownStatus {
    pub active: bool,
    pub remaining_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub stop_reason: Option<StopReason>,
    pub cooldown: CooldownStatus,
    pub last_verdict: Option<DetectionVerdict>,
    pub ticks: u64,
    pub dispatches: u64,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.running, self.stop_reason) {
            (true, _) => "running",
            (false, Some(StopReason::SurfaceClosed)) => "stopped (surface closed)",
            (false, _) => "stopped",
        };
        writeln!(f, "{:<12}{state}", "state:")?;
        writeln!(f, "{:<12}{}", "ticks:", self.ticks)?;
        writeln!(f, "{:<12}{}", "dispatches:", self.dispatches)?;
        if self.cooldown.active {
            writeln!(
                f,
                "{:<12}active, {:.1}s of {:.1}s left",
                "cooldown:",
                self.cooldown.remaining_seconds, self.cooldown.duration_seconds
            )?;
        } else {
            writeln!(f, "{:<12}idle ({:.1}s)", "cooldown:", self.cooldown.duration_seconds)?;
        }
        match self.last_verdict {
            Some(ref v) => write!(f, "{:<12}{}", "last:", v.summary()),
            None => write!(f, "{:<12}-", "last:"),
        }
    }
}
