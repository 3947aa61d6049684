//! Device collaborator contract.
//!
//! The scheduler never talks to camera hardware itself. It drives an
//! implementation of [`Device`], whose calls are blocking and may take an
//! unpredictable amount of time. Everything in this module describes what the
//! scheduler and its tasks rely on from that lower layer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::notify::{Notifier, Subscription, SubscriptionId};
use crate::core::progress::Progress;
use crate::core::DeviceError;

/// Per-poll timeout used by [`Device::flush_events`].
pub const FLUSH_POLL: Duration = Duration::from_millis(10);

/// A file living on (or just read from) the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFile {
    /// Folder on the device, e.g. `/store_00010001/DCIM/100CANON`.
    pub folder: String,
    /// File name inside `folder`.
    pub name: String,
    /// MIME type, when the driver reports one.
    pub mime_type: Option<String>,
    /// Raw payload, present for previews and downloaded files.
    #[serde(skip)]
    pub data: Option<Arc<[u8]>>,
}

impl DeviceFile {
    /// Create a file reference without payload.
    pub fn new(folder: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
            mime_type: None,
            data: None,
        }
    }

    /// Attach a MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Arc<[u8]>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Full device-side path.
    pub fn path(&self) -> String {
        if self.folder.ends_with('/') {
            format!("{}{}", self.folder, self.name)
        } else {
            format!("{}/{}", self.folder, self.name)
        }
    }
}

impl fmt::Display for DeviceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of a single [`Device::wait_for_event`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Nothing happened before the timeout.
    Timeout,
    /// A new file appeared on the device (e.g. shutter pressed on the body).
    FileAdded(DeviceFile),
    /// A new folder appeared on the device.
    FolderAdded {
        /// Parent folder.
        folder: String,
        /// New folder name.
        name: String,
    },
    /// The device finished an internal capture.
    CaptureComplete,
    /// Driver specific event without a mapping.
    Unknown(String),
}

/// Notifications a device publishes to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceNotification {
    /// A spontaneous file was reported by the event channel.
    FileAdded(DeviceFile),
    /// `capture_image` produced a file.
    FileCaptured(DeviceFile),
    /// `capture_preview` produced a frame.
    FilePreviewed(DeviceFile),
    /// `download` completed; the file carries its payload.
    FileDownloaded(DeviceFile),
    /// `delete` removed a file from the device.
    FileDeleted(DeviceFile),
}

impl DeviceNotification {
    /// The file the notification is about.
    pub fn file(&self) -> &DeviceFile {
        match self {
            Self::FileAdded(file)
            | Self::FileCaptured(file)
            | Self::FilePreviewed(file)
            | Self::FileDownloaded(file)
            | Self::FileDeleted(file) => file,
        }
    }
}

/// Capability object the scheduler drives.
///
/// All methods are called from the scheduler's worker thread once it is
/// running. Implementations publish [`DeviceNotification`]s through their
/// [`Notifier`]: `FileAdded` when `wait_for_event` observes a new file, and
/// the captured/previewed/downloaded/deleted notifications from the matching
/// calls.
pub trait Device: Send + Sync {
    /// Whether the device connection is open.
    fn is_connected(&self) -> bool;

    /// Trigger the shutter and return the resulting file (still on the device).
    fn capture_image(&self) -> Result<DeviceFile, DeviceError>;

    /// Grab a live-view frame. The returned file carries its payload.
    fn capture_preview(&self) -> Result<DeviceFile, DeviceError>;

    /// Read the file contents from the device.
    fn download(&self, file: &DeviceFile) -> Result<Vec<u8>, DeviceError>;

    /// Remove the file from the device storage.
    fn delete(&self, file: &DeviceFile) -> Result<(), DeviceError>;

    /// Block for at most `timeout` waiting for one device event.
    fn wait_for_event(&self, timeout: Duration) -> Result<DeviceEvent, DeviceError>;

    /// Drain pending events until the device reports a timeout.
    fn flush_events(&self) -> Result<(), DeviceError> {
        loop {
            if self.wait_for_event(FLUSH_POLL)? == DeviceEvent::Timeout {
                return Ok(());
            }
        }
    }

    /// Notification hub for this device.
    fn notifier(&self) -> &Notifier;

    /// Start receiving this device's notifications.
    fn subscribe(&self) -> Subscription {
        self.notifier().subscribe()
    }

    /// Stop delivering notifications to `id`. Returns `false` if unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier().unsubscribe(id)
    }

    /// Progress/cancellation sink attached by the controller, if any.
    fn progress(&self) -> Option<Arc<dyn Progress>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_file_path() {
        let file = DeviceFile::new("/store_00010001/DCIM/100CANON", "IMG_0001.JPG");
        assert_eq!(file.path(), "/store_00010001/DCIM/100CANON/IMG_0001.JPG");

        let root = DeviceFile::new("/", "capt0000.jpg");
        assert_eq!(root.to_string(), "/capt0000.jpg");
    }

    #[test]
    fn test_device_file_builders() {
        let file = DeviceFile::new("/", "preview.jpg")
            .with_mime_type("image/jpeg")
            .with_data(vec![0xff, 0xd8, 0xff]);
        assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(file.data.as_deref(), Some(&[0xff, 0xd8, 0xff][..]));
    }

    #[test]
    fn test_notification_file() {
        let file = DeviceFile::new("/", "a.jpg");
        let note = DeviceNotification::FileDeleted(file.clone());
        assert_eq!(note.file(), &file);
    }
}
