//! Poll loop: surface → detector → dispatcher → cooldown gate.
//! Runs as a tokio task that exclusively owns the detection state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior, interval};

use surfwatch_core::cooldown::delta_secs;
use surfwatch_core::{
    Baseline, Clock, CooldownGate, DetectionVerdict, Detector, GateCheck, Snapshot,
};
use surfwatch_surface::{ActionDispatcher, SurfaceProvider};

use crate::status::{CooldownStatus, EngineStatus, StopReason};

/// Collaborators and fixed settings shared by every run of the loop.
#[derive(Clone)]
pub struct LoopDeps {
    pub surface: Arc<dyn SurfaceProvider>,
    pub dispatcher: Arc<dyn ActionDispatcher>,
    pub detector: Detector,
    pub clock: Arc<dyn Clock>,
    pub check_interval: Duration,
    /// False for diagnostic runs: verdicts are reported, never acted on.
    pub dispatch_enabled: bool,
}

/// State owned by one run of the loop.
#[derive(Debug)]
pub struct PollState {
    /// `None` until the first successful snapshot.
    pub baseline: Option<Baseline>,
    pub gate: CooldownGate,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_verdict: Option<DetectionVerdict>,
    pub ticks: u64,
    pub dispatches: u64,
}

impl PollState {
    pub fn new(gate: CooldownGate) -> Self {
        Self {
            baseline: None,
            gate,
            last_poll: None,
            last_verdict: None,
            ticks: 0,
            dispatches: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Skipped,
    Succeeded,
    Failed,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    SurfaceClosed,
    /// First snapshot became the baseline.
    Initialized { item_count: usize },
    /// Cooldown elapsed; baseline rebuilt, detection skipped.
    Resynced { item_count: usize },
    Verdict {
        verdict: DetectionVerdict,
        dispatch: Dispatch,
    },
}

async fn blocking_snapshot(surface: &Arc<dyn SurfaceProvider>) -> anyhow::Result<Snapshot> {
    let surface = Arc::clone(surface);
    let snap = tokio::task::spawn_blocking(move || surface.snapshot()).await??;
    Ok(snap)
}

async fn blocking_alive(surface: &Arc<dyn SurfaceProvider>) -> anyhow::Result<bool> {
    let surface = Arc::clone(surface);
    Ok(tokio::task::spawn_blocking(move || surface.surface_alive()).await?)
}

/// One iteration. An `Err` means the tick was a no-op.
pub async fn poll_tick(
    deps: &LoopDeps,
    state: &mut PollState,
    cooldown_secs: f64,
) -> anyhow::Result<TickOutcome> {
    state.ticks += 1;

    if !blocking_alive(&deps.surface).await? {
        return Ok(TickOutcome::SurfaceClosed);
    }

    let snapshot = blocking_snapshot(&deps.surface).await?;
    let now = deps.clock.now();
    let since_last = state.last_poll.map(|t| now.signed_duration_since(t));
    state.last_poll = Some(now);

    let history = deps.detector.config().history_size;
    let Some(baseline) = state.baseline.as_mut() else {
        let baseline = Baseline::from_snapshot(&snapshot, history);
        tracing::info!(
            items = baseline.item_count,
            label = %baseline.surface_label,
            "baseline initialized"
        );
        state.baseline = Some(baseline);
        return Ok(TickOutcome::Initialized {
            item_count: snapshot.len(),
        });
    };

    match state.gate.check(now) {
        GateCheck::ResyncDue => {
            baseline.resync(&snapshot);
            state.gate.complete_resync();
            tracing::info!(items = baseline.item_count, "cooldown over, baseline resynced");
            return Ok(TickOutcome::Resynced {
                item_count: snapshot.len(),
            });
        }
        GateCheck::Cooling { remaining } => {
            tracing::trace!("cooling, {:.1}s left", delta_secs(remaining));
        }
        GateCheck::Idle => {}
    }

    let mut assessment = deps
        .detector
        .assess(&snapshot, baseline, &state.gate, since_last);
    if assessment.needs_confirmation() {
        tokio::time::sleep(deps.detector.confirm_delay()).await;
        let resample = match blocking_snapshot(&deps.surface).await {
            Ok(snap) => Some(snap),
            Err(e) => {
                tracing::debug!("confirmation re-sample failed: {e}");
                None
            }
        };
        assessment.confirm(resample.as_ref());
    }
    let verdict = deps.detector.commit(assessment, baseline);
    state.last_verdict = Some(verdict.clone());

    if !verdict.is_new_event {
        tracing::debug!("{}", verdict.summary());
        return Ok(TickOutcome::Verdict {
            verdict,
            dispatch: Dispatch::Skipped,
        });
    }

    tracing::info!(reason = %verdict.reason, "new message detected: {}", verdict.summary());
    if !deps.dispatch_enabled {
        return Ok(TickOutcome::Verdict {
            verdict,
            dispatch: Dispatch::Skipped,
        });
    }

    let dispatcher = Arc::clone(&deps.dispatcher);
    let result = tokio::task::spawn_blocking(move || dispatcher.perform_action()).await?;
    let dispatch = match result {
        Ok(()) => {
            state.dispatches += 1;
            state.gate.set_duration(cooldown_secs)?;
            state.gate.begin(deps.clock.now());
            tracing::info!("action dispatched, cooling down for {cooldown_secs:.1}s");
            Dispatch::Succeeded
        }
        Err(e) => {
            tracing::warn!("action dispatch failed: {e}");
            Dispatch::Failed
        }
    };
    Ok(TickOutcome::Verdict { verdict, dispatch })
}

/// Status as seen at `now`.
pub fn status_of(state: &PollState, now: DateTime<Utc>, cooldown_secs: f64) -> EngineStatus {
    EngineStatus {
        running: true,
        stop_reason: None,
        cooldown: CooldownStatus {
            active: state.gate.is_active(),
            remaining_seconds: state.gate.remaining(now).map_or(0.0, delta_secs),
            duration_seconds: cooldown_secs,
        },
        last_verdict: state.last_verdict.clone(),
        ticks: state.ticks,
        dispatches: state.dispatches,
    }
}

/// Run until `stop` turns true (or its sender is dropped) or the surface
/// disappears. Publishes status after every tick.
pub async fn run_poll_loop(
    deps: Arc<LoopDeps>,
    mut stop: watch::Receiver<bool>,
    cooldown: watch::Receiver<f64>,
    status: Arc<watch::Sender<EngineStatus>>,
) {
    let initial_secs = *cooldown.borrow();
    let gate = CooldownGate::from_secs(initial_secs).unwrap_or_default();
    let mut state = PollState::new(gate);

    let mut ticker = interval(deps.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!("poll loop started");

    loop {
        if *stop.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let cooldown_secs = *cooldown.borrow();
        match poll_tick(&deps, &mut state, cooldown_secs).await {
            Ok(TickOutcome::SurfaceClosed) => {
                tracing::info!("surface closed, stopping");
                status.send_modify(|s| {
                    s.running = false;
                    s.stop_reason = Some(StopReason::SurfaceClosed);
                    s.ticks = state.ticks;
                });
                return;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("poll tick failed: {e}"),
        }
        // A stop that arrived mid-tick owns the published status.
        if *stop.borrow() {
            break;
        }
        let snapshot = status_of(&state, deps.clock.now(), cooldown_secs);
        status.send_replace(snapshot);
    }

    tracing::info!("poll loop stopped");
}
