//! Live-view burst followed by a capture.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::TaskConfig;
use crate::core::{Device, DeviceError, Task};

use super::capture_sequence;

pub(super) const NAME: &str = "preview";
const LABEL: &str = "Preview an image";

/// Grab `frames` preview frames, pausing `interval` after each, then run a
/// full capture sequence.
///
/// Frames are dropped as soon as they arrive; controllers render them from
/// the device's `FilePreviewed` notifications. Any preview failure aborts the
/// task before the capture.
#[derive(Debug, Clone)]
pub struct PreviewTask {
    frames: u32,
    interval: Duration,
}

impl PreviewTask {
    /// Default number of live-view frames.
    pub const DEFAULT_FRAMES: u32 = 20;
    /// Default pause between frames.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    /// Create a preview task with the default burst.
    pub fn new() -> Self {
        Self {
            frames: Self::DEFAULT_FRAMES,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Create a preview task from task tuning.
    pub fn from_config(cfg: &TaskConfig) -> Self {
        Self {
            frames: cfg.preview_frames,
            interval: Duration::from_millis(cfg.preview_interval_ms),
        }
    }

    /// Set the number of frames.
    #[must_use]
    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    /// Set the pause between frames.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Configured number of frames.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Configured pause between frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PreviewTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for PreviewTask {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn execute(&self, device: &dyn Device) -> Result<(), DeviceError> {
        for frame in 0..self.frames {
            debug!(frame, "starting preview");
            let preview = device.capture_preview()?;
            drop(preview);
            thread::sleep(self.interval);
        }

        capture_sequence(device)
    }
}
