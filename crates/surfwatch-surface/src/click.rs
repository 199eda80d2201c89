//! Sticker click sequence driven from calibrated screen positions.
//!
//! Sequence: activate window, click the sticker button, wait for the panel,
//! click a random point inside the panel (away from its edges), wait for the
//! send, then click outside the panel to dismiss it.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use surfwatch_core::Bounds;

use crate::error::SurfaceError;
use crate::executor::{CommandRunner, split_command};
use crate::provider::ActionDispatcher;

/// Inset applied to the panel before picking a random point.
pub const PANEL_MARGIN: i32 = 20;
/// Offset from the panel's top-right corner for the dismiss click.
pub const DISMISS_OFFSET: i32 = 50;
pub const DEFAULT_CLICK_TEMPLATE: &str = "xdotool mousemove {x} {y} click 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Positions recorded during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub button: Point,
    pub panel: Bounds,
}

impl Calibration {
    /// Panel shrunk by [`PANEL_MARGIN`] on every side.
    pub fn pick_area(&self) -> Result<Bounds, SurfaceError> {
        let area = Bounds::new(
            self.panel.left.saturating_add(PANEL_MARGIN),
            self.panel.top.saturating_add(PANEL_MARGIN),
            self.panel.right.saturating_sub(PANEL_MARGIN),
            self.panel.bottom.saturating_sub(PANEL_MARGIN),
        );
        if area.width() < 0 || area.height() < 0 {
            return Err(SurfaceError::NotCalibrated(format!(
                "panel {} is smaller than twice the {PANEL_MARGIN}px margin",
                self.panel
            )));
        }
        Ok(area)
    }

    pub fn dismiss_point(&self) -> Point {
        Point::new(
            self.panel.right.saturating_add(DISMISS_OFFSET),
            self.panel.top.saturating_add(DISMISS_OFFSET),
        )
    }
}

/// Pauses between the steps of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTiming {
    pub after_activate: Duration,
    pub click_delay: Duration,
    /// Extra wait for the panel to open after the button click.
    pub panel_open: Duration,
    /// Extra wait for the sticker to send before dismissing.
    pub send_settle: Duration,
}

impl ClickTiming {
    pub fn with_click_delay(click_delay: Duration) -> Self {
        Self {
            after_activate: Duration::from_millis(100),
            click_delay,
            panel_open: Duration::from_millis(300),
            send_settle: Duration::from_millis(200),
        }
    }

    pub fn immediate() -> Self {
        Self {
            after_activate: Duration::ZERO,
            click_delay: Duration::ZERO,
            panel_open: Duration::ZERO,
            send_settle: Duration::ZERO,
        }
    }
}

impl Default for ClickTiming {
    fn default() -> Self {
        Self::with_click_delay(Duration::from_millis(200))
    }
}

/// The three clicks of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickPlan {
    pub button: Point,
    pub sticker: Point,
    pub dismiss: Point,
}

// ─── Input driver ─────────────────────────────────────────────────

/// Synthesises pointer input.
pub trait InputDriver: Send + Sync {
    fn click(&self, at: Point) -> Result<(), SurfaceError>;

    /// Bring the observed window to the foreground.
    fn activate(&self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &T {
    fn click(&self, at: Point) -> Result<(), SurfaceError> {
        (**self).click(at)
    }

    fn activate(&self) -> Result<(), SurfaceError> {
        (**self).activate()
    }
}

/// Runs a command template per click; `{x}` and `{y}` are substituted.
pub struct CommandInputDriver<R: CommandRunner> {
    runner: R,
    click_template: String,
    activate_command: Option<String>,
}

impl<R: CommandRunner> CommandInputDriver<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            click_template: DEFAULT_CLICK_TEMPLATE.to_string(),
            activate_command: None,
        }
    }

    #[must_use]
    pub fn with_click_template(mut self, template: impl Into<String>) -> Self {
        self.click_template = template.into();
        self
    }

    #[must_use]
    pub fn with_activate_command(mut self, command: impl Into<String>) -> Self {
        self.activate_command = Some(command.into());
        self
    }

    fn run_line(&self, line: &str) -> Result<(), SurfaceError> {
        let (program, args) = split_command(line)
            .ok_or_else(|| SurfaceError::NotCalibrated("empty input command".to_string()))?;
        self.runner.run(program, &args)?;
        Ok(())
    }
}

impl<R: CommandRunner> InputDriver for CommandInputDriver<R> {
    fn click(&self, at: Point) -> Result<(), SurfaceError> {
        let line = self
            .click_template
            .replace("{x}", &at.x.to_string())
            .replace("{y}", &at.y.to_string());
        self.run_line(&line)
    }

    fn activate(&self) -> Result<(), SurfaceError> {
        match self.activate_command {
            Some(ref line) => self.run_line(line),
            None => Ok(()),
        }
    }
}

// ─── Dispatchers ──────────────────────────────────────────────────

pub struct ClickDispatcher<D: InputDriver> {
    driver: D,
    calibration: Calibration,
    timing: ClickTiming,
    rng: Mutex<StdRng>,
}

impl<D: InputDriver> ClickDispatcher<D> {
    pub fn new(driver: D, calibration: Calibration, timing: ClickTiming) -> Self {
        Self {
            driver,
            calibration,
            timing,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sticker choice.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Choose the points for the next sequence.
    pub fn plan(&self) -> Result<ClickPlan, SurfaceError> {
        let area = self.calibration.pick_area()?;
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let sticker = Point::new(
            rng.gen_range(area.left..=area.right),
            rng.gen_range(area.top..=area.bottom),
        );
        Ok(ClickPlan {
            button: self.calibration.button,
            sticker,
            dismiss: self.calibration.dismiss_point(),
        })
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

impl<D: InputDriver> ActionDispatcher for ClickDispatcher<D> {
    fn perform_action(&self) -> Result<(), SurfaceError> {
        let plan = self.plan()?;
        let t = self.timing;

        self.driver.activate()?;
        pause(t.after_activate);

        self.driver.click(plan.button)?;
        pause(t.click_delay + t.panel_open);

        self.driver.click(plan.sticker)?;
        tracing::info!(x = plan.sticker.x, y = plan.sticker.y, "sticker clicked");
        pause(t.click_delay + t.send_settle);

        self.driver.click(plan.dismiss)?;
        Ok(())
    }
}

/// Logs instead of clicking.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDispatcher;

impl ActionDispatcher for DryRunDispatcher {
    fn perform_action(&self) -> Result<(), SurfaceError> {
        tracing::info!("dry run: action suppressed");
        Ok(())
    }
}
