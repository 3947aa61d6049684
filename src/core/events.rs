//! Bounded waiting on the device event channel.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::{Device, DeviceError, DeviceEvent};

/// Consume device events for up to `budget`.
///
/// Keeps calling [`Device::wait_for_event`] with the remaining budget until
/// the device reports a timeout or the budget is spent. Returns how many
/// non-timeout events were observed. An error from the device is returned
/// as-is; the scheduler treats it as fatal.
pub fn wait_for_events(device: &dyn Device, budget: Duration) -> Result<usize, DeviceError> {
    let start = Instant::now();
    let mut seen = 0;

    loop {
        let remaining = budget.saturating_sub(start.elapsed());
        match device.wait_for_event(remaining)? {
            DeviceEvent::Timeout => {
                debug!(seen, "event wait timed out");
                break;
            }
            DeviceEvent::FileAdded(file) => {
                debug!(file = %file, "file added");
                seen += 1;
            }
            DeviceEvent::FolderAdded { folder, name } => {
                debug!(%folder, %name, "folder added");
                seen += 1;
            }
            DeviceEvent::CaptureComplete => {
                debug!("capture is complete");
                seen += 1;
            }
            DeviceEvent::Unknown(what) => {
                debug!(event = %what, "unknown event");
                seen += 1;
            }
        }

        if start.elapsed() >= budget {
            break;
        }
    }

    Ok(seen)
}
