//! Runtime configuration: JSON file, defaults, CLI overrides, and the
//! collaborators built from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use surfwatch_core::DetectorConfig;
use surfwatch_core::cooldown::{DEFAULT_COOLDOWN_SECS, secs_to_delta};
use surfwatch_surface::click::DEFAULT_CLICK_TEMPLATE;
use surfwatch_surface::{
    ActionDispatcher, Calibration, ClickDispatcher, ClickTiming, CommandInputDriver,
    DryRunDispatcher, ProbeSurface, ProcessRunner, ReplaySurface, SurfaceProvider,
};

pub const DEFAULT_PROBE_COMMAND: &str = "surfwatch-probe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceSource {
    /// External command printing one JSON snapshot per run.
    Probe {
        command: String,
        #[serde(default)]
        alive_command: Option<String>,
    },
    /// Recorded frames replayed from a fixture file.
    Replay { path: PathBuf },
}

impl Default for SurfaceSource {
    fn default() -> Self {
        Self::Probe {
            command: DEFAULT_PROBE_COMMAND.to_string(),
            alive_command: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatcherConfig {
    Click {
        #[serde(default)]
        calibration: Option<Calibration>,
        #[serde(default = "default_click_command")]
        click_command: String,
        #[serde(default)]
        activate_command: Option<String>,
        /// Fixed RNG seed for reproducible sticker choice.
        #[serde(default)]
        seed: Option<u64>,
    },
    #[default]
    DryRun,
}

fn default_click_command() -> String {
    DEFAULT_CLICK_TEMPLATE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub surface: SurfaceSource,
    pub dispatcher: DispatcherConfig,
    pub check_interval_ms: u64,
    pub click_delay_ms: u64,
    pub cooldown_secs: f64,
    pub stop_timeout_ms: u64,
    /// Limit on each probe or input command run.
    pub command_timeout_ms: u64,
    pub detector: DetectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            surface: SurfaceSource::default(),
            dispatcher: DispatcherConfig::default(),
            check_interval_ms: 500,
            click_delay_ms: 200,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            stop_timeout_ms: 2000,
            command_timeout_ms: 5000,
            detector: DetectorConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub replay: Option<PathBuf>,
    pub dry_run: bool,
    pub cooldown_secs: Option<f64>,
    pub interval_ms: Option<u64>,
}

impl Config {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(ref path) = overrides.replay {
            self.surface = SurfaceSource::Replay { path: path.clone() };
        }
        if overrides.dry_run {
            self.dispatcher = DispatcherConfig::DryRun;
        }
        if let Some(secs) = overrides.cooldown_secs {
            self.cooldown_secs = secs;
        }
        if let Some(ms) = overrides.interval_ms {
            self.check_interval_ms = ms;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.detector.validate()?;
        secs_to_delta(self.cooldown_secs)?;
        anyhow::ensure!(self.check_interval_ms > 0, "check_interval_ms must be positive");
        anyhow::ensure!(self.command_timeout_ms > 0, "command_timeout_ms must be positive");
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    fn runner(&self) -> ProcessRunner {
        ProcessRunner::new().with_timeout(Duration::from_millis(self.command_timeout_ms))
    }

    pub fn build_surface(&self) -> anyhow::Result<Arc<dyn SurfaceProvider>> {
        match self.surface {
            SurfaceSource::Probe {
                ref command,
                ref alive_command,
            } => {
                let mut probe = ProbeSurface::new(self.runner(), command)?;
                if let Some(alive) = alive_command {
                    probe = probe.with_alive_command(alive)?;
                }
                Ok(Arc::new(probe))
            }
            SurfaceSource::Replay { ref path } => Ok(Arc::new(ReplaySurface::load(path)?)),
        }
    }

    pub fn build_dispatcher(&self) -> anyhow::Result<Arc<dyn ActionDispatcher>> {
        match self.dispatcher {
            DispatcherConfig::DryRun => Ok(Arc::new(DryRunDispatcher)),
            DispatcherConfig::Click {
                calibration,
                ref click_command,
                ref activate_command,
                seed,
            } => {
                let calibration = calibration.context(
                    "click dispatcher needs dispatcher.calibration (button and panel positions)",
                )?;
                calibration.pick_area()?;
                let mut driver =
                    CommandInputDriver::new(self.runner()).with_click_template(click_command);
                if let Some(cmd) = activate_command {
                    driver = driver.with_activate_command(cmd);
                }
                let timing = ClickTiming::with_click_delay(Duration::from_millis(self.click_delay_ms));
                let mut dispatcher = ClickDispatcher::new(driver, calibration, timing);
                if let Some(seed) = seed {
                    dispatcher = dispatcher.with_seed(seed);
                }
                Ok(Arc::new(dispatcher))
            }
        }
    }
}
