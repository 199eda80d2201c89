//! Diagnostic run: poll and print every verdict, never dispatch.

use std::io::Write;

use surfwatch_core::CooldownGate;
use tokio::time::{MissedTickBehavior, interval};

use crate::poll_loop::{LoopDeps, PollState, TickOutcome, poll_tick};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnoseSummary {
    pub ticks: u64,
    pub events: u64,
    pub failures: u64,
}

/// Poll `max_ticks` times (forever if `None`), writing one line per tick.
pub async fn run_diagnose<W: Write>(
    deps: &LoopDeps,
    max_ticks: Option<u64>,
    out: &mut W,
) -> anyhow::Result<DiagnoseSummary> {
    let deps = LoopDeps {
        dispatch_enabled: false,
        ..deps.clone()
    };
    let mut state = PollState::new(CooldownGate::default());
    let mut summary = DiagnoseSummary::default();
    let mut ticker = interval(deps.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    writeln!(out, "diagnostic run: change the observed surface and watch the verdicts")?;
    while max_ticks.is_none_or(|max| summary.ticks < max) {
        ticker.tick().await;
        summary.ticks += 1;
        match poll_tick(&deps, &mut state, 0.0).await {
            Ok(TickOutcome::SurfaceClosed) => {
                writeln!(out, "[{:>4}] surface closed", summary.ticks)?;
                break;
            }
            Ok(TickOutcome::Initialized { item_count }) => {
                let label = state
                    .baseline
                    .as_ref()
                    .map(|b| b.surface_label.as_str())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "[{:>4}] initial state: {item_count} items, label {label:?}",
                    summary.ticks
                )?;
            }
            Ok(TickOutcome::Resynced { item_count }) => {
                writeln!(out, "[{:>4}] resynced: {item_count} items", summary.ticks)?;
            }
            Ok(TickOutcome::Verdict { verdict, .. }) => {
                if verdict.is_new_event {
                    summary.events += 1;
                }
                writeln!(out, "[{:>4}] {}", summary.ticks, verdict.summary())?;
            }
            Err(e) => {
                summary.failures += 1;
                writeln!(out, "[{:>4}] tick failed: {e}", summary.ticks)?;
            }
        }
        out.flush()?;
    }
    writeln!(
        out,
        "{} ticks, {} new events, {} failed reads",
        summary.ticks, summary.events, summary.failures
    )?;
    Ok(summary)
}
