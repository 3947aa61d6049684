//! Error types for device operations and scheduler control.

use thiserror::Error;

/// Errors reported by a [`Device`](crate::core::Device) while servicing a call.
///
/// A device error raised inside a task is scoped to that task: it ends up in
/// the task-end outcome and never stops the scheduler. Only a failure of the
/// event channel (see [`DeviceError::Event`]) is escalated by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device connection is closed.
    #[error("device is not connected")]
    NotConnected,
    /// Capturing a full image failed.
    #[error("unable to capture image: {0}")]
    Capture(String),
    /// Capturing a preview frame failed.
    #[error("unable to capture preview: {0}")]
    Preview(String),
    /// Downloading a file from the device failed.
    #[error("unable to download {path}: {reason}")]
    Download {
        /// Device-side path of the file.
        path: String,
        /// Driver supplied reason.
        reason: String,
    },
    /// Deleting a file on the device failed.
    #[error("unable to delete {path}: {reason}")]
    Delete {
        /// Device-side path of the file.
        path: String,
        /// Driver supplied reason.
        reason: String,
    },
    /// Waiting for or flushing device events failed.
    #[error("unable to wait for events: {0}")]
    Event(String),
    /// The driver does not implement the operation.
    #[error("operation not supported: {0}")]
    NotSupported(String),
}

/// Errors produced by scheduler control operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called while the worker is alive.
    #[error("scheduler is already running")]
    AlreadyRunning,
    /// A control call needs a running worker.
    #[error("scheduler is not running")]
    NotRunning,
    /// The bound device is not connected.
    #[error("device is not connected")]
    DeviceDisconnected,
    /// The worker thread could not be created.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
