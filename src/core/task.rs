//! Units of work executed against a device.
//!
//! A task carries only its identity (`name`, `label`) and whatever tuning it
//! was built with; all device state stays in the [`Device`]. Tasks are
//! single-shot: the scheduler runs each one once and drops it after emitting
//! the task-end notification, whatever the outcome.
//!
//! Three variants ship with the crate:
//!
//! - [`CaptureTask`] - capture, download and delete one image
//! - [`PreviewTask`] - a burst of live-view frames followed by a capture
//! - [`MonitorTask`] - collect files the device produces on its own until
//!   cancelled through the progress sink

mod capture;
mod monitor;
mod preview;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaskConfig;
use crate::core::{Device, DeviceError};

pub use capture::CaptureTask;
pub use monitor::MonitorTask;
pub use preview::PreviewTask;

/// Sequence number the scheduler assigns to each enqueued task.
pub type TaskId = u64;

/// A unit of work run by the scheduler's worker.
pub trait Task: Send + 'static {
    /// Machine identifier, e.g. `capture`.
    fn name(&self) -> &str;

    /// Human readable description.
    fn label(&self) -> &str;

    /// Run against `device`. Called on the worker thread; may block for as
    /// long as the device calls take.
    ///
    /// # Errors
    ///
    /// Returns the device error that made the task fail. The error is scoped
    /// to this task and never stops the scheduler.
    fn execute(&self, device: &dyn Device) -> Result<(), DeviceError>;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name())
            .field("label", &self.label())
            .finish()
    }
}

/// Snapshot of a task's identity carried by scheduler notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Scheduler-assigned id.
    pub id: TaskId,
    /// Machine identifier.
    pub name: String,
    /// Human readable description.
    pub label: String,
}

impl TaskInfo {
    pub(crate) fn of(id: TaskId, task: &dyn Task) -> Self {
        Self {
            id,
            name: task.name().to_string(),
            label: task.label().to_string(),
        }
    }
}

/// Built-in task variants, addressable by machine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// [`CaptureTask`].
    Capture,
    /// [`PreviewTask`].
    Preview,
    /// [`MonitorTask`].
    Monitor,
}

impl TaskKind {
    /// Machine name used by [`Task::name`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Capture => capture::NAME,
            Self::Preview => preview::NAME,
            Self::Monitor => monitor::NAME,
        }
    }

    /// Build a task of this kind with the given tuning.
    pub fn build(self, cfg: &TaskConfig) -> Box<dyn Task> {
        match self {
            Self::Capture => Box::new(CaptureTask::new()),
            Self::Preview => Box::new(PreviewTask::from_config(cfg)),
            Self::Monitor => Box::new(MonitorTask::from_config(cfg)),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            capture::NAME => Ok(Self::Capture),
            preview::NAME => Ok(Self::Preview),
            monitor::NAME => Ok(Self::Monitor),
            other => Err(format!("unknown task `{other}`")),
        }
    }
}

/// Capture one image, download it, then remove it from the device.
///
/// A failed download still attempts the delete so the card does not fill up,
/// and reports the download error; a failed cleanup there is only logged. A
/// failed delete after a good download is reported as a failure, so callers
/// cannot assume a failed capture left nothing behind on the device.
pub(crate) fn capture_sequence(device: &dyn Device) -> Result<(), DeviceError> {
    debug!("starting capture");
    let file = device.capture_image()?;

    match device.download(&file) {
        Ok(data) => {
            debug!(file = %file, bytes = data.len(), "downloaded capture");
        }
        Err(err) => {
            debug!(file = %file, error = %err, "failed to download capture");
            if let Err(cleanup) = device.delete(&file) {
                debug!(file = %file, error = %cleanup, "failed to delete after download failure");
            }
            return Err(err);
        }
    }

    device.delete(&file)
}
