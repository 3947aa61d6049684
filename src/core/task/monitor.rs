//! Collect files the device produces on its own.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::TaskConfig;
use crate::core::events::wait_for_events;
use crate::core::{Device, DeviceError, DeviceFile, DeviceNotification, Task};

pub(super) const NAME: &str = "monitor";
const LABEL: &str = "Monitor for new images";

/// Watch the event channel and download + delete every file the device
/// reports, until the device's progress sink is cancelled.
///
/// Download and delete failures are logged and skipped. An event-wait failure
/// ends the watch early. The task itself always succeeds.
#[derive(Debug, Clone)]
pub struct MonitorTask {
    wait: Duration,
}

impl MonitorTask {
    /// Default ceiling for a single event wait.
    pub const DEFAULT_WAIT: Duration = Duration::from_millis(500);

    /// Create a monitor with the default event wait.
    pub fn new() -> Self {
        Self {
            wait: Self::DEFAULT_WAIT,
        }
    }

    /// Create a monitor from task tuning.
    pub fn from_config(cfg: &TaskConfig) -> Self {
        Self {
            wait: Duration::from_millis(cfg.monitor_wait_ms),
        }
    }

    /// Set the event wait ceiling.
    #[must_use]
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    fn collect(device: &dyn Device, file: &DeviceFile) {
        if let Err(err) = device.download(file) {
            warn!(file = %file, error = %err, "failed to download monitored file");
        }
        if let Err(err) = device.delete(file) {
            warn!(file = %file, error = %err, "failed to delete monitored file");
        }
    }
}

impl Default for MonitorTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for MonitorTask {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn execute(&self, device: &dyn Device) -> Result<(), DeviceError> {
        let Some(progress) = device.progress() else {
            warn!("no progress sink attached, monitor cannot be cancelled; skipping");
            return Ok(());
        };

        let subscription = device.subscribe();
        while !progress.cancelled() {
            debug!("waiting for events");
            if let Err(err) = wait_for_events(device, self.wait) {
                warn!(error = %err, "event wait failed, ending monitor");
                break;
            }

            for notification in subscription.try_iter() {
                if let DeviceNotification::FileAdded(file) = notification {
                    Self::collect(device, &file);
                }
            }
        }

        device.unsubscribe(subscription.id());
        Ok(())
    }
}
