//! Scripted in-process device for testing without camera hardware.
//!
//! `MockDevice` records every call it receives, can be told to fail any
//! operation, and lets a test inject events that the next `wait_for_event`
//! returns. Downloads report progress through the attached sink in a few
//! chunks, the way a real driver does for large raw files.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::core::{
    Device, DeviceError, DeviceEvent, DeviceFile, DeviceNotification, Notifier, Progress,
    Subscription, SubscriptionId,
};

const DOWNLOAD_CHUNKS: u32 = 4;
const JPEG_MAGIC: [u8; 4] = [0xff, 0xd8, 0xff, 0xe0];
const SIMULATED: &str = "simulated failure";

/// Operations that can be switched to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    /// `capture_image`.
    CaptureImage,
    /// `capture_preview`.
    CapturePreview,
    /// `download`.
    Download,
    /// `delete`.
    Delete,
    /// `wait_for_event`.
    WaitForEvent,
    /// `flush_events`.
    FlushEvents,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    /// `capture_image`.
    CaptureImage,
    /// `capture_preview`.
    CapturePreview,
    /// `download` of the file at this path.
    Download(String),
    /// `delete` of the file at this path.
    Delete(String),
    /// `wait_for_event`.
    WaitForEvent,
    /// `flush_events`.
    FlushEvents,
    /// `subscribe`, with the id handed out.
    Subscribe(SubscriptionId),
    /// `unsubscribe` of this id.
    Unsubscribe(SubscriptionId),
}

impl DeviceCall {
    /// Whether this call touched files (capture, preview, download, delete).
    pub fn is_file_io(&self) -> bool {
        matches!(
            self,
            Self::CaptureImage | Self::CapturePreview | Self::Download(_) | Self::Delete(_)
        )
    }
}

/// Scripted [`Device`] implementation.
pub struct MockDevice {
    folder: String,
    latency: Duration,
    connected: AtomicBool,
    captured: AtomicU32,
    calls: Mutex<Vec<DeviceCall>>,
    failures: Mutex<HashSet<MockOp>>,
    events: Mutex<VecDeque<DeviceEvent>>,
    event_ready: Condvar,
    notifier: Notifier,
    progress: Mutex<Option<Arc<dyn Progress>>>,
}

impl MockDevice {
    /// A connected device writing captures to `/store_00010001/DCIM/100MOCK`.
    pub fn new() -> Self {
        Self {
            folder: "/store_00010001/DCIM/100MOCK".into(),
            latency: Duration::ZERO,
            connected: AtomicBool::new(true),
            captured: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            events: Mutex::new(VecDeque::new()),
            event_ready: Condvar::new(),
            notifier: Notifier::new(),
            progress: Mutex::new(None),
        }
    }

    /// Delay every capture, preview, download and delete by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Folder new captures are reported in.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Make `op` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, op: MockOp) {
        self.failures.lock().insert(op);
    }

    /// Make `op` succeed again.
    pub fn recover(&self, op: MockOp) {
        self.failures.lock().remove(&op);
    }

    /// Simulate the cable being pulled. Wakes a pending event wait.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.event_ready.notify_all();
    }

    /// Simulate reconnecting.
    pub fn connect(&self) {
        self.connected.store(true, Ordering::Release);
    }

    /// Queue an event for a future `wait_for_event`.
    pub fn inject_event(&self, event: DeviceEvent) {
        self.events.lock().push_back(event);
        self.event_ready.notify_all();
    }

    /// Queue a `FileAdded` event for a file in the capture folder.
    pub fn inject_file(&self, name: &str) -> DeviceFile {
        let file = DeviceFile::new(self.folder.clone(), name).with_mime_type("image/jpeg");
        self.inject_event(DeviceEvent::FileAdded(file.clone()));
        file
    }

    /// Attach or detach the progress/cancellation sink.
    pub fn set_progress(&self, progress: Option<Arc<dyn Progress>>) {
        *self.progress.lock() = progress;
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    /// Only the file I/O calls received so far, in order.
    pub fn file_calls(&self) -> Vec<DeviceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.is_file_io())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of events injected but not yet consumed.
    pub fn pending_events(&self) -> usize {
        self.events.lock().len()
    }

    fn record(&self, call: DeviceCall) {
        trace!(?call, "mock device call");
        self.calls.lock().push(call);
    }

    fn failing(&self, op: MockOp) -> bool {
        self.failures.lock().contains(&op)
    }

    fn ensure_connected(&self) -> Result<(), DeviceError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DeviceError::NotConnected)
        }
    }

    fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    fn payload_for(file: &DeviceFile) -> Vec<u8> {
        let mut data = JPEG_MAGIC.to_vec();
        data.extend_from_slice(file.name.as_bytes());
        data
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn capture_image(&self) -> Result<DeviceFile, DeviceError> {
        self.record(DeviceCall::CaptureImage);
        self.ensure_connected()?;
        self.simulate_latency();
        if self.failing(MockOp::CaptureImage) {
            return Err(DeviceError::Capture(SIMULATED.into()));
        }

        let n = self.captured.fetch_add(1, Ordering::Relaxed);
        let file = DeviceFile::new(self.folder.clone(), format!("capt{n:04}.jpg"))
            .with_mime_type("image/jpeg");
        self.notifier
            .publish(&DeviceNotification::FileCaptured(file.clone()));
        Ok(file)
    }

    fn capture_preview(&self) -> Result<DeviceFile, DeviceError> {
        self.record(DeviceCall::CapturePreview);
        self.ensure_connected()?;
        self.simulate_latency();
        if self.failing(MockOp::CapturePreview) {
            return Err(DeviceError::Preview(SIMULATED.into()));
        }

        let file = DeviceFile::new("/", "preview.jpg")
            .with_mime_type("image/jpeg")
            .with_data(JPEG_MAGIC.to_vec());
        self.notifier
            .publish(&DeviceNotification::FilePreviewed(file.clone()));
        Ok(file)
    }

    fn download(&self, file: &DeviceFile) -> Result<Vec<u8>, DeviceError> {
        self.record(DeviceCall::Download(file.path()));
        self.ensure_connected()?;

        let progress = self.progress.lock().clone();
        if let Some(progress) = &progress {
            progress.start(DOWNLOAD_CHUNKS as f32, &format!("Downloading {}", file.name));
        }
        for chunk in 1..=DOWNLOAD_CHUNKS {
            self.simulate_latency();
            if let Some(progress) = &progress {
                progress.update(chunk as f32);
            }
        }
        if let Some(progress) = &progress {
            progress.stop();
        }

        if self.failing(MockOp::Download) {
            return Err(DeviceError::Download {
                path: file.path(),
                reason: SIMULATED.into(),
            });
        }

        let data = Self::payload_for(file);
        let downloaded = file.clone().with_data(data.clone());
        self.notifier
            .publish(&DeviceNotification::FileDownloaded(downloaded));
        Ok(data)
    }

    fn delete(&self, file: &DeviceFile) -> Result<(), DeviceError> {
        self.record(DeviceCall::Delete(file.path()));
        self.ensure_connected()?;
        self.simulate_latency();
        if self.failing(MockOp::Delete) {
            return Err(DeviceError::Delete {
                path: file.path(),
                reason: SIMULATED.into(),
            });
        }

        self.notifier
            .publish(&DeviceNotification::FileDeleted(file.clone()));
        Ok(())
    }

    fn wait_for_event(&self, timeout: Duration) -> Result<DeviceEvent, DeviceError> {
        self.record(DeviceCall::WaitForEvent);
        self.ensure_connected()?;
        if self.failing(MockOp::WaitForEvent) {
            return Err(DeviceError::Event(SIMULATED.into()));
        }

        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        let event = loop {
            if let Some(event) = events.pop_front() {
                break event;
            }
            if !self.is_connected() {
                return Err(DeviceError::NotConnected);
            }
            if self.event_ready.wait_until(&mut events, deadline).timed_out() {
                break events.pop_front().unwrap_or(DeviceEvent::Timeout);
            }
        };
        drop(events);

        if let DeviceEvent::FileAdded(file) = &event {
            self.notifier
                .publish(&DeviceNotification::FileAdded(file.clone()));
        }
        Ok(event)
    }

    /// Records the call but leaves injected events in place, so scripted
    /// events reach the next idle wait or monitor deterministically.
    fn flush_events(&self) -> Result<(), DeviceError> {
        self.record(DeviceCall::FlushEvents);
        self.ensure_connected()?;
        if self.failing(MockOp::FlushEvents) {
            return Err(DeviceError::Event(SIMULATED.into()));
        }
        Ok(())
    }

    fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn subscribe(&self) -> Subscription {
        let subscription = self.notifier.subscribe();
        self.record(DeviceCall::Subscribe(subscription.id()));
        subscription
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.record(DeviceCall::Unsubscribe(id));
        self.notifier.unsubscribe(id)
    }

    fn progress(&self) -> Option<Arc<dyn Progress>> {
        self.progress.lock().clone()
    }
}
