//! Error types for monitor operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced synchronously by the monitor.
///
/// Runtime failures reported by the backend while a watch is active do not
/// appear here: they are delivered as normal events with
/// [`EventKind::Error`](crate::EventKind::Error) and leave the monitor
/// running.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The underlying watch could not be created or enabled, e.g. the root
    /// path does not exist or permissions are insufficient.
    #[error("cannot establish watch on {path}: {reason}")]
    WatchSetupFailed { path: PathBuf, reason: String },

    /// Operation attempted after the monitor was closed.
    #[error("monitor has been disposed")]
    Disposed,
}

impl MonitorError {
    pub(crate) fn setup(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        MonitorError::WatchSetupFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
