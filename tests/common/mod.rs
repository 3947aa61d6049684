//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tether_scheduler::config::SchedulerConfig;
use tether_scheduler::core::{
    CameraScheduler, Device, DeviceError, SchedulerEvent, Task,
};
use tether_scheduler::infra::MockDevice;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Short idle wait so tests notice stop and pause quickly.
pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig::new().with_event_wait(Duration::from_millis(20))
}

pub fn scheduler_with(device: &Arc<MockDevice>) -> CameraScheduler {
    tether_scheduler::util::init_test_tracing();
    let device: Arc<dyn Device> = device.clone();
    CameraScheduler::with_config(device, fast_config()).unwrap()
}

pub fn next_event(scheduler: &CameraScheduler) -> SchedulerEvent {
    scheduler
        .recv_event_timeout(EVENT_TIMEOUT)
        .expect("scheduler event within timeout")
}

/// Read events until the worker reports `Stopped`, returning all of them.
pub fn events_until_stopped(scheduler: &CameraScheduler) -> Vec<SchedulerEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(scheduler);
        let done = matches!(event, SchedulerEvent::Stopped { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

// ============================================================================
// TEST TASKS
// ============================================================================

/// Appends its index to a shared log.
pub struct RecordingTask {
    pub index: usize,
    pub log: Arc<Mutex<Vec<usize>>>,
}

impl Task for RecordingTask {
    fn name(&self) -> &str {
        "record"
    }

    fn label(&self) -> &str {
        "Record execution order"
    }

    fn execute(&self, _device: &dyn Device) -> Result<(), DeviceError> {
        self.log.lock().push(self.index);
        Ok(())
    }
}

/// Signals when it starts, then blocks until released.
pub struct GateTask {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Handle for a [`GateTask`].
pub struct Gate {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

impl Gate {
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(EVENT_TIMEOUT)
            .expect("gate task entered");
    }

    pub fn open(&self) {
        let _ = self.release.send(());
    }
}

pub fn gate() -> (GateTask, Gate) {
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    (
        GateTask {
            entered: entered_tx,
            release: release_rx,
        },
        Gate {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

impl Task for GateTask {
    fn name(&self) -> &str {
        "gate"
    }

    fn label(&self) -> &str {
        "Block until released"
    }

    fn execute(&self, _device: &dyn Device) -> Result<(), DeviceError> {
        let _ = self.entered.send(());
        let _ = self.release.recv_timeout(EVENT_TIMEOUT);
        Ok(())
    }
}

pub struct PanickingTask;

impl Task for PanickingTask {
    fn name(&self) -> &str {
        "panic"
    }

    fn label(&self) -> &str {
        "Panic while executing"
    }

    fn execute(&self, _device: &dyn Device) -> Result<(), DeviceError> {
        panic!("task blew up");
    }
}
