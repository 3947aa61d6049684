//! Tests for the built-in tasks, run directly against `MockDevice`.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tether_scheduler::core::{
    CaptureTask, ChannelProgress, Device, DeviceError, DeviceNotification, MonitorTask,
    PreviewTask, Progress, Task,
};
use tether_scheduler::infra::{DeviceCall, MockDevice, MockOp};

const CAPT0: &str = "/store_00010001/DCIM/100MOCK/capt0000.jpg";

// ============================================================================
// CAPTURE
// ============================================================================

#[test]
fn test_capture_downloads_then_deletes() {
    let device = MockDevice::new();
    CaptureTask::new().execute(&device).unwrap();

    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::CaptureImage,
            DeviceCall::Download(CAPT0.into()),
            DeviceCall::Delete(CAPT0.into()),
        ]
    );
}

#[test]
fn test_capture_failure_touches_nothing_else() {
    let device = MockDevice::new();
    device.fail(MockOp::CaptureImage);

    let err = CaptureTask::new().execute(&device).unwrap_err();
    assert!(matches!(err, DeviceError::Capture(_)));
    assert_eq!(device.calls(), vec![DeviceCall::CaptureImage]);
}

#[test]
fn test_download_failure_still_deletes() {
    let device = MockDevice::new();
    device.fail(MockOp::Download);

    let err = CaptureTask::new().execute(&device).unwrap_err();
    assert_eq!(
        err,
        DeviceError::Download {
            path: CAPT0.into(),
            reason: "simulated failure".into()
        }
    );
    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::CaptureImage,
            DeviceCall::Download(CAPT0.into()),
            DeviceCall::Delete(CAPT0.into()),
        ]
    );
}

#[test]
fn test_download_failure_reports_download_error_when_cleanup_fails() {
    let device = MockDevice::new();
    device.fail(MockOp::Download);
    device.fail(MockOp::Delete);

    let err = CaptureTask::new().execute(&device).unwrap_err();
    assert!(matches!(err, DeviceError::Download { .. }));
}

#[test]
fn test_delete_failure_fails_the_task() {
    let device = MockDevice::new();
    device.fail(MockOp::Delete);

    let err = CaptureTask::new().execute(&device).unwrap_err();
    assert!(matches!(err, DeviceError::Delete { .. }));
    assert_eq!(device.file_calls().len(), 3);
}

#[test]
fn test_capture_publishes_notifications() {
    let device = MockDevice::new();
    let subscription = device.subscribe();
    CaptureTask::new().execute(&device).unwrap();

    let notes: Vec<_> = subscription.try_iter().collect();
    assert_eq!(notes.len(), 3);
    assert!(matches!(notes[0], DeviceNotification::FileCaptured(_)));
    match &notes[1] {
        DeviceNotification::FileDownloaded(file) => assert!(file.data.is_some()),
        other => panic!("expected FileDownloaded, got {other:?}"),
    }
    assert!(matches!(notes[2], DeviceNotification::FileDeleted(_)));
}

// ============================================================================
// PREVIEW
// ============================================================================

#[test]
fn test_preview_burst_then_capture() {
    let device = MockDevice::new();
    let task = PreviewTask::new()
        .with_frames(3)
        .with_interval(Duration::from_millis(1));
    task.execute(&device).unwrap();

    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::CapturePreview,
            DeviceCall::CapturePreview,
            DeviceCall::CapturePreview,
            DeviceCall::CaptureImage,
            DeviceCall::Download(CAPT0.into()),
            DeviceCall::Delete(CAPT0.into()),
        ]
    );
}

#[test]
fn test_preview_failure_aborts_before_capture() {
    let device = MockDevice::new();
    device.fail(MockOp::CapturePreview);
    let task = PreviewTask::new().with_interval(Duration::from_millis(1));

    let err = task.execute(&device).unwrap_err();
    assert!(matches!(err, DeviceError::Preview(_)));
    assert_eq!(device.calls(), vec![DeviceCall::CapturePreview]);
}

#[test]
fn test_preview_defaults() {
    let task = PreviewTask::default();
    assert_eq!(task.frames(), 20);
    assert_eq!(task.interval(), Duration::from_millis(100));
    assert_eq!(task.name(), "preview");
    assert_eq!(task.label(), "Preview an image");
}

// ============================================================================
// MONITOR
// ============================================================================

#[test]
fn test_monitor_without_progress_sink_returns_immediately() {
    let device = MockDevice::new();
    MonitorTask::new().execute(&device).unwrap();
    assert!(device.calls().is_empty());
}

#[test]
fn test_monitor_collects_added_files_until_cancelled() {
    let device = Arc::new(MockDevice::new());
    let (progress, _progress_rx) = ChannelProgress::new();
    let progress = Arc::new(progress);
    device.set_progress(Some(progress.clone() as Arc<dyn Progress>));
    let watcher = device.subscribe();

    let a = device.inject_file("IMG_0001.JPG");
    let b = device.inject_file("IMG_0002.JPG");

    let worker = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            MonitorTask::new()
                .with_wait(Duration::from_millis(20))
                .execute(device.as_ref())
        })
    };

    let mut deleted = Vec::new();
    while deleted.len() < 2 {
        match watcher.receiver().recv_timeout(common::EVENT_TIMEOUT) {
            Ok(DeviceNotification::FileDeleted(file)) => deleted.push(file),
            Ok(_) => {}
            Err(e) => panic!("monitor did not collect files: {e}"),
        }
    }
    thread::sleep(Duration::from_millis(50));
    assert!(!worker.is_finished(), "monitor returned before cancellation");
    progress.cancel();
    worker.join().unwrap().unwrap();

    assert_eq!(deleted, vec![a.clone(), b.clone()]);
    let calls = device.calls();
    assert!(calls.contains(&DeviceCall::Download(a.path())));
    assert!(calls.contains(&DeviceCall::Delete(b.path())));
    let unsubscribes = calls
        .iter()
        .filter(|call| matches!(call, DeviceCall::Unsubscribe(_)))
        .count();
    assert_eq!(unsubscribes, 1);
    assert_eq!(device.notifier().subscriber_count(), 1);
}

#[test]
fn test_monitor_skips_failed_downloads() {
    let device = Arc::new(MockDevice::new());
    let (progress, _progress_rx) = ChannelProgress::new();
    let progress = Arc::new(progress);
    device.set_progress(Some(progress.clone() as Arc<dyn Progress>));
    device.fail(MockOp::Download);
    let watcher = device.subscribe();
    let file = device.inject_file("IMG_0003.JPG");

    let worker = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            MonitorTask::new()
                .with_wait(Duration::from_millis(20))
                .execute(device.as_ref())
        })
    };

    loop {
        match watcher.receiver().recv_timeout(common::EVENT_TIMEOUT) {
            Ok(DeviceNotification::FileDeleted(deleted)) => {
                assert_eq!(deleted, file);
                break;
            }
            Ok(_) => {}
            Err(e) => panic!("monitor did not clean up: {e}"),
        }
    }
    progress.cancel();
    assert!(worker.join().unwrap().is_ok());
}

#[test]
fn test_monitor_ends_on_event_wait_failure() {
    let device = MockDevice::new();
    let (progress, _progress_rx) = ChannelProgress::new();
    device.set_progress(Some(Arc::new(progress)));
    device.fail(MockOp::WaitForEvent);

    MonitorTask::new()
        .with_wait(Duration::from_millis(20))
        .execute(&device)
        .unwrap();

    let calls = device.calls();
    assert!(matches!(calls.first(), Some(DeviceCall::Subscribe(_))));
    assert_eq!(calls[1], DeviceCall::WaitForEvent);
    assert!(matches!(calls.last(), Some(DeviceCall::Unsubscribe(_))));
    assert_eq!(calls.len(), 3);
}
