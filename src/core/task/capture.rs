//! Single image capture.

use crate::core::{Device, DeviceError, Task};

use super::capture_sequence;

pub(super) const NAME: &str = "capture";
const LABEL: &str = "Capture an image";

/// Capture an image, download it and delete it from the device.
#[derive(Debug, Clone, Default)]
pub struct CaptureTask;

impl CaptureTask {
    /// Create a capture task.
    pub fn new() -> Self {
        Self
    }
}

impl Task for CaptureTask {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn execute(&self, device: &dyn Device) -> Result<(), DeviceError> {
        capture_sequence(device)
    }
}
