//! Cooldown gate: suppresses detection after the system's own action.
//!
//! Two states:
//!
//! - **Idle**: detection runs normally.
//! - **Cooling**: entered via [`CooldownGate::begin`] right after a successful
//!   dispatch. While cooling, [`CooldownGate::check`] reports `Cooling` until
//!   `now - started_at >= duration`, then `ResyncDue`. The gate only returns
//!   to Idle through [`CooldownGate::complete_resync`], which the caller
//!   invokes once the baseline has been rebuilt from a fresh snapshot. A
//!   failed resync therefore leaves detection suppressed and is retried on
//!   the next tick.
//!
//! The configured duration is copied into each episode at `begin`, so
//! changing it never alters a cooldown already in progress.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::CoreError;

/// Default cooldown after a dispatch (seconds).
pub const DEFAULT_COOLDOWN_SECS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Idle,
    Cooling {
        started_at: DateTime<Utc>,
        duration: TimeDelta,
    },
}

/// Result of a transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCheck {
    Idle,
    Cooling { remaining: TimeDelta },
    /// Duration elapsed; the baseline must be resynced before detecting.
    ResyncDue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownGate {
    duration: TimeDelta,
    state: CooldownState,
}

impl CooldownGate {
    pub fn new(duration: TimeDelta) -> Self {
        Self {
            duration: duration.max(TimeDelta::zero()),
            state: CooldownState::Idle,
        }
    }

    /// Gate configured from a seconds value, validated like [`Self::set_duration`].
    pub fn from_secs(secs: f64) -> Result<Self, CoreError> {
        Ok(Self::new(secs_to_delta(secs)?))
    }

    /// Change the duration used by the next episode.
    pub fn set_duration(&mut self, secs: f64) -> Result<(), CoreError> {
        self.duration = secs_to_delta(secs)?;
        Ok(())
    }

    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CooldownState::Cooling { .. })
    }

    /// Idle → Cooling. Restarts the episode if already cooling.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.state = CooldownState::Cooling {
            started_at: now,
            duration: self.duration,
        };
    }

    pub fn check(&self, now: DateTime<Utc>) -> GateCheck {
        match self.state {
            CooldownState::Idle => GateCheck::Idle,
            CooldownState::Cooling {
                started_at,
                duration,
            } => {
                let elapsed = now.signed_duration_since(started_at);
                if elapsed >= duration {
                    GateCheck::ResyncDue
                } else {
                    GateCheck::Cooling {
                        remaining: duration - elapsed,
                    }
                }
            }
        }
    }

    /// Cooling → Idle. Returns false if the gate was not cooling.
    pub fn complete_resync(&mut self) -> bool {
        let was_cooling = self.is_active();
        self.state = CooldownState::Idle;
        was_cooling
    }

    /// Time left in the current episode; `None` when idle.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match self.check(now) {
            GateCheck::Idle => None,
            GateCheck::Cooling { remaining } => Some(remaining),
            GateCheck::ResyncDue => Some(TimeDelta::zero()),
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(TimeDelta::milliseconds(
            (DEFAULT_COOLDOWN_SECS * 1000.0) as i64,
        ))
    }
}

/// Validate a seconds value and convert it to a millisecond-precision delta.
pub fn secs_to_delta(secs: f64) -> Result<TimeDelta, CoreError> {
    if !secs.is_finite() || secs < 0.0 || secs > (i64::MAX / 1000) as f64 {
        return Err(CoreError::InvalidCooldown(secs));
    }
    #[expect(clippy::cast_possible_truncation)]
    let millis = (secs * 1000.0).round() as i64;
    Ok(TimeDelta::milliseconds(millis))
}

/// Delta as fractional seconds, for status reporting.
pub fn delta_secs(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}
