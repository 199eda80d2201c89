//! Engine controller: owns the poll loop task and the channels to it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use surfwatch_core::CoreError;
use surfwatch_core::cooldown::secs_to_delta;

use crate::poll_loop::{LoopDeps, run_poll_loop};
use crate::status::{CooldownStatus, EngineStatus, StopReason};

struct Running {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct Engine {
    deps: Arc<LoopDeps>,
    stop_timeout: Duration,
    cooldown: watch::Sender<f64>,
    status: Arc<watch::Sender<EngineStatus>>,
    running: Option<Running>,
}

impl Engine {
    pub fn new(
        deps: LoopDeps,
        cooldown_secs: f64,
        stop_timeout: Duration,
    ) -> Result<Self, CoreError> {
        secs_to_delta(cooldown_secs)?;
        let (cooldown, _) = watch::channel(cooldown_secs);
        let (status, _) = watch::channel(EngineStatus {
            cooldown: CooldownStatus {
                duration_seconds: cooldown_secs,
                ..Default::default()
            },
            ..EngineStatus::default()
        });
        Ok(Self {
            deps: Arc::new(deps),
            stop_timeout,
            cooldown,
            status: Arc::new(status),
            running: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawn the poll loop. Returns false if it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            tracing::info!("already running");
            return false;
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        self.status.send_modify(|s| {
            s.running = true;
            s.stop_reason = None;
        });
        let handle = tokio::spawn(run_poll_loop(
            Arc::clone(&self.deps),
            stop_rx,
            self.cooldown.subscribe(),
            Arc::clone(&self.status),
        ));
        self.running = Some(Running {
            stop: stop_tx,
            handle,
        });
        tracing::info!("engine started");
        true
    }

    /// Signal the loop and wait for it, at most `stop_timeout`.
    /// Returns false if nothing was running.
    pub async fn stop(&mut self) -> bool {
        let Some(mut running) = self.running.take() else {
            return false;
        };
        let was_running = !running.handle.is_finished();
        let _ = running.stop.send(true);
        match tokio::time::timeout(self.stop_timeout, &mut running.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("poll loop task failed: {e}"),
            Err(_) => {
                // Cancelled at its next await; a blocking call already in
                // flight finishes on its own thread.
                running.handle.abort();
                tracing::warn!(
                    "poll loop did not stop within {:?}, aborted",
                    self.stop_timeout
                );
            }
        }
        if was_running {
            self.status.send_modify(|s| {
                s.running = false;
                s.stop_reason = Some(StopReason::Requested);
            });
            tracing::info!("engine stopped");
        }
        was_running
    }

    /// Applies from the next dispatch; a cooldown in progress keeps its length.
    pub fn set_cooldown(&self, secs: f64) -> Result<(), CoreError> {
        secs_to_delta(secs)?;
        self.cooldown.send_replace(secs);
        self.status
            .send_modify(|s| s.cooldown.duration_seconds = secs);
        tracing::info!("cooldown set to {secs}s");
        Ok(())
    }

    pub fn cooldown_secs(&self) -> f64 {
        *self.cooldown.borrow()
    }

    /// Latest published status; may lag the loop by one tick.
    pub fn status(&self) -> EngineStatus {
        let mut status = self.status.borrow().clone();
        status.running = self.is_running();
        status
    }

    pub fn deps(&self) -> &Arc<LoopDeps> {
        &self.deps
    }
}
