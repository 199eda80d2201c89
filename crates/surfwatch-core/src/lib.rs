//! surfwatch-core: feedback-safe change detection over an unstable UI tree.
//!
//! Pure logic only: no IO, no async. Time is always passed in.

pub mod baseline;
pub mod clock;
pub mod cooldown;
pub mod detect;
pub mod error;
pub mod origin;
pub mod signature;
pub mod types;

pub use baseline::{Baseline, FingerprintHistory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::{CooldownGate, GateCheck};
pub use detect::{Assessment, DetectionReason, DetectionVerdict, Detector, DetectorConfig};
pub use error::CoreError;
pub use origin::is_self_originated;
pub use signature::{fingerprint_of, fingerprints_of};
pub use types::{Bounds, ChildElement, Fingerprint, ItemDescriptor, Snapshot};
