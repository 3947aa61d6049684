//! Progress reporting and task-level cancellation.
//!
//! A [`Progress`] sink is attached to the device by the controller. Device
//! implementations report long operations through it and long running tasks
//! poll [`Progress::cancelled`] as their termination condition. This is a
//! separate layer from the scheduler's own stop flag: stopping the scheduler
//! never cancels the operation in flight.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Sink for progress of blocking device operations.
///
/// Every method is invoked from the scheduler's worker thread and must not
/// block.
pub trait Progress: Send + Sync {
    /// A long operation started; `target` is the value `update` counts toward.
    fn start(&self, target: f32, label: &str);
    /// The operation advanced to `current`.
    fn update(&self, current: f32);
    /// The operation finished (successfully or not).
    fn stop(&self);
    /// Whether the controller asked the running task to stop.
    fn cancelled(&self) -> bool;
}

/// Progress messages marshalled to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// An operation started.
    Started {
        /// Value the operation counts toward.
        target: f32,
        /// Human readable description.
        label: String,
    },
    /// An operation advanced.
    Updated {
        /// Current value.
        current: f32,
    },
    /// An operation finished.
    Stopped,
}

/// [`Progress`] implementation forwarding events over a channel.
///
/// The controller keeps the receiver and drains it from its own loop, so
/// progress rendering never runs on the worker thread. `cancel`/`reset` give
/// the controller the task-level cancellation switch.
#[derive(Debug)]
pub struct ChannelProgress {
    cancelled: AtomicBool,
    tx: Sender<ProgressEvent>,
}

impl ChannelProgress {
    /// Create a sink and the receiver the controller should drain.
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = unbounded();
        (
            Self {
                cancelled: AtomicBool::new(false),
                tx,
            },
            rx,
        )
    }

    /// Ask the running task to finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Clear a previous cancellation so the sink can serve a new task.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    fn send(&self, event: ProgressEvent) {
        // Controller may have dropped the receiver; progress is advisory.
        let _ = self.tx.send(event);
    }
}

impl Progress for ChannelProgress {
    fn start(&self, target: f32, label: &str) {
        self.send(ProgressEvent::Started {
            target,
            label: label.to_string(),
        });
    }

    fn update(&self, current: f32) {
        self.send(ProgressEvent::Updated { current });
    }

    fn stop(&self) {
        self.send(ProgressEvent::Stopped);
    }

    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
