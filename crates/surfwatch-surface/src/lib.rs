//! surfwatch-surface: IO boundary between the detection core and the
//! observed application.

pub mod click;
pub mod error;
pub mod executor;
pub mod frame;
pub mod probe;
pub mod provider;
pub mod replay;
pub mod scripted;

pub use click::{
    Calibration, ClickDispatcher, ClickPlan, ClickTiming, CommandInputDriver, DryRunDispatcher,
    InputDriver, Point,
};
pub use error::SurfaceError;
pub use executor::{CommandRunner, ProcessRunner};
pub use frame::{FrameEntry, SnapshotFrame};
pub use probe::ProbeSurface;
pub use provider::{ActionDispatcher, SurfaceProvider};
pub use replay::ReplaySurface;
pub use scripted::{RecordingDispatcher, ScriptedSurface};
