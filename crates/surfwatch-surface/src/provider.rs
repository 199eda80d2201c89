//! Collaborator traits consumed by the poll loop.

use std::sync::Arc;

use surfwatch_core::Snapshot;

use crate::error::SurfaceError;

/// Source of snapshots for one observed surface.
///
/// Calls are blocking and expected to return within bounded time; the
/// runtime invokes them on a blocking thread.
pub trait SurfaceProvider: Send + Sync {
    /// Current item sequence plus surface label and geometry.
    fn snapshot(&self) -> Result<Snapshot, SurfaceError>;

    /// False once the observed application has gone away.
    fn surface_alive(&self) -> bool;
}

/// Performs the reaction (a click sequence) on the surface.
pub trait ActionDispatcher: Send + Sync {
    /// Safe to call repeatedly; `Ok` means the full sequence ran.
    fn perform_action(&self) -> Result<(), SurfaceError>;
}

impl<T: SurfaceProvider + ?Sized> SurfaceProvider for Arc<T> {
    fn snapshot(&self) -> Result<Snapshot, SurfaceError> {
        (**self).snapshot()
    }

    fn surface_alive(&self) -> bool {
        (**self).surface_alive()
    }
}

impl<T: ActionDispatcher + ?Sized> ActionDispatcher for Arc<T> {
    fn perform_action(&self) -> Result<(), SurfaceError> {
        (**self).perform_action()
    }
}
