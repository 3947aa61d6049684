//! Per-device task scheduler.
//!
//! A [`CameraScheduler`] owns one task queue and one dedicated OS thread for
//! a single device. The worker runs queued tasks strictly one at a time, in
//! enqueue order, and while idle waits on the device event channel so that
//! spontaneous device activity (a file written to the card, a folder
//! created) is picked up without busy-spinning.
//!
//! # Control surface
//!
//! - [`start`](CameraScheduler::start) spawns the worker
//! - [`enqueue`](CameraScheduler::enqueue) hands a task to the worker
//! - [`stop`](CameraScheduler::stop) requests exit and returns immediately
//! - [`pause`](CameraScheduler::pause) / [`resume`](CameraScheduler::resume)
//!   park the worker between cycles
//!
//! None of these block on device I/O. The one exception is `pause`, which
//! waits for the worker to reach the end of its current cycle.
//!
//! # Notifications
//!
//! The worker reports through a crossbeam channel of [`SchedulerEvent`]s that
//! the controller drains from its own loop. Every task produces exactly one
//! `TaskBegin` followed by one `TaskEnd`; every run of the worker ends with one
//! `Stopped`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether_scheduler::core::{CameraScheduler, CaptureTask, SchedulerEvent};
//! use tether_scheduler::infra::MockDevice;
//!
//! let device = Arc::new(MockDevice::new());
//! let scheduler = CameraScheduler::new(device);
//! scheduler.start()?;
//! scheduler.enqueue(CaptureTask::new())?;
//!
//! while let Ok(event) = scheduler.events().recv() {
//!     if let SchedulerEvent::TaskEnd { task, outcome } = event {
//!         println!("{} finished: {:?}", task.label, outcome);
//!         break;
//!     }
//! }
//! scheduler.stop()?;
//! # Ok::<(), tether_scheduler::core::SchedulerError>(())
//! ```

mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::builders::build_queue;
use crate::config::SchedulerConfig;
use crate::core::{Device, SchedulerError, Task, TaskId, TaskInfo, TaskQueue};

/// Result of one task execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The task returned `Ok`.
    Succeeded,
    /// The task returned an error (or panicked); carries the message.
    Failed(String),
}

impl TaskOutcome {
    /// Whether the task succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Why the worker exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `stop()` was called, or the scheduler handle was dropped.
    Requested,
    /// The device reported itself disconnected.
    Disconnected,
    /// Waiting on the device event channel failed.
    EventChannelFailed(String),
}

/// Notifications emitted by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// A task is about to execute.
    TaskBegin {
        /// The task.
        task: TaskInfo,
    },
    /// A task finished executing.
    TaskEnd {
        /// The task.
        task: TaskInfo,
        /// How it went.
        outcome: TaskOutcome,
    },
    /// The worker exited; no further task notifications follow until the
    /// next `start()`.
    Stopped {
        /// Why it exited.
        reason: StopReason,
    },
}

/// Statistics about scheduler activity since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks accepted by `enqueue`.
    pub submitted: u64,
    /// Tasks that returned `Ok`.
    pub completed: u64,
    /// Tasks that returned an error.
    pub failed: u64,
    /// Tasks dropped unexecuted when a worker exited.
    pub discarded: u64,
    /// Tasks currently waiting in the queue.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

/// A task waiting in the queue together with its assigned id.
pub(crate) struct QueuedTask {
    pub(crate) id: TaskId,
    pub(crate) task: Box<dyn Task>,
}

#[derive(Debug, Default)]
struct WorkerState {
    running: bool,
    cancelled: bool,
    pause_requested: bool,
    paused: bool,
    resume: bool,
}

/// State shared between the handle and the worker thread.
///
/// The worker holds its own `Arc` for its whole lifetime, so the device and
/// queue outlive the last in-flight task even if the handle is dropped.
struct Shared {
    id: Uuid,
    device: Arc<dyn Device>,
    config: SchedulerConfig,
    queue: Box<dyn TaskQueue<QueuedTask>>,
    state: Mutex<WorkerState>,
    state_changed: Condvar,
    events_tx: Sender<SchedulerEvent>,
    counters: Counters,
    next_task_id: AtomicU64,
}

impl Shared {
    fn emit(&self, event: SchedulerEvent) {
        // The handle owns the receiver; once it is gone nobody is listening.
        let _ = self.events_tx.send(event);
    }

    fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }
}

/// Scheduler bound to one device for its whole lifetime.
///
/// To drive another device, build another scheduler.
pub struct CameraScheduler {
    shared: Arc<Shared>,
    events_rx: Receiver<SchedulerEvent>,
}

impl CameraScheduler {
    /// Create a stopped scheduler with default configuration.
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self::build(device, SchedulerConfig::default())
    }

    /// Create a stopped scheduler with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn with_config(
        device: Arc<dyn Device>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self::build(device, config))
    }

    fn build(device: Arc<dyn Device>, config: SchedulerConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        let shared = Shared {
            id: Uuid::new_v4(),
            device,
            queue: build_queue(config.queue),
            config,
            state: Mutex::new(WorkerState::default()),
            state_changed: Condvar::new(),
            events_tx,
            counters: Counters::default(),
            next_task_id: AtomicU64::new(1),
        };
        debug!(scheduler = %shared.id, queue = ?shared.config.queue, "camera scheduler created");
        Self {
            shared: Arc::new(shared),
            events_rx,
        }
    }

    /// Unique id of this scheduler, used in log fields and the thread name.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// The device this scheduler drives.
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.shared.device
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AlreadyRunning` if a worker is alive
    /// - `SchedulerError::DeviceDisconnected` if the device is not connected
    /// - `SchedulerError::Spawn` if the OS refused to create the thread
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut state = self.shared.state.lock();
            if state.running {
                return Err(SchedulerError::AlreadyRunning);
            }
            if !self.shared.device.is_connected() {
                return Err(SchedulerError::DeviceDisconnected);
            }
            *state = WorkerState {
                running: true,
                ..WorkerState::default()
            };
        }

        let short_id = self.shared.id.simple().to_string();
        let mut builder = thread::Builder::new()
            .name(format!("{}-{}", self.shared.config.thread_name, &short_id[..8]));
        if let Some(stack_size) = self.shared.config.thread_stack_size {
            builder = builder.stack_size(stack_size);
        }

        let shared = Arc::clone(&self.shared);
        match builder.spawn(move || worker::run(shared)) {
            Ok(_detached) => {
                info!(scheduler = %self.shared.id, "camera scheduler started");
                Ok(())
            }
            Err(e) => {
                // The closure, and with it the worker's Arc, was dropped by spawn.
                self.shared.state.lock().running = false;
                self.shared.state_changed.notify_all();
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Ask the worker to exit and return immediately.
    ///
    /// The worker notices between tasks and after each event wait, so the
    /// device may still be busy when this returns. Tasks still queued at that
    /// point are discarded unexecuted. Use [`wait_stopped`](Self::wait_stopped)
    /// to wait for the exit.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if no worker is alive.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        if !state.running {
            return Err(SchedulerError::NotRunning);
        }
        state.cancelled = true;
        self.shared.state_changed.notify_all();
        debug!(scheduler = %self.shared.id, "stop requested");
        Ok(())
    }

    /// Queue a task for the worker.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if no worker is alive or a stop
    /// has been requested.
    pub fn enqueue<T: Task>(&self, task: T) -> Result<TaskId, SchedulerError> {
        self.enqueue_boxed(Box::new(task))
    }

    /// Queue an already boxed task, e.g. one built from a [`TaskKind`](crate::core::TaskKind).
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if no worker is alive or a stop
    /// has been requested.
    pub fn enqueue_boxed(&self, task: Box<dyn Task>) -> Result<TaskId, SchedulerError> {
        // Held across the push: the worker drains the queue under this lock
        // when it exits, so nothing can slip in behind the drain.
        let state = self.shared.state.lock();
        if !state.running || state.cancelled {
            return Err(SchedulerError::NotRunning);
        }

        let id = self.shared.next_task_id.fetch_add(1, Ordering::Relaxed);
        debug!(scheduler = %self.shared.id, task_id = id, task = task.name(), "task queued");
        self.shared.queue.push(QueuedTask { id, task });
        self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Park the worker at the end of its current cycle.
    ///
    /// Blocks until the worker acknowledges the pause. Queued tasks stay
    /// queued while paused.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if no worker is alive, or if it
    /// exited before reaching the pause point.
    pub fn pause(&self) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        if !state.running || state.cancelled {
            return Err(SchedulerError::NotRunning);
        }
        // A pending resume means the worker is about to run again.
        if state.paused && !state.resume {
            return Ok(());
        }

        state.pause_requested = true;
        debug!(scheduler = %self.shared.id, "waiting for worker to pause");
        while state.pause_requested && state.running {
            self.shared.state_changed.wait(&mut state);
        }

        if state.running {
            debug!(scheduler = %self.shared.id, "worker is paused");
            Ok(())
        } else {
            Err(SchedulerError::NotRunning)
        }
    }

    /// Release a paused worker. A no-op if the worker is not paused.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NotRunning` if no worker is alive.
    pub fn resume(&self) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        if !state.running {
            return Err(SchedulerError::NotRunning);
        }
        if state.paused {
            state.resume = true;
            self.shared.state_changed.notify_all();
            debug!(scheduler = %self.shared.id, "resume signalled");
        }
        Ok(())
    }

    /// Whether a worker is alive.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Whether the worker is parked by `pause`.
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Snapshot of activity counters.
    pub fn stats(&self) -> SchedulerStats {
        let counters = &self.shared.counters;
        SchedulerStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
            queued: self.shared.queue.len(),
        }
    }

    /// Block until the worker has exited or `timeout` passes.
    /// Returns `true` if no worker is running.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.running {
            if self
                .shared
                .state_changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        !state.running
    }

    /// Receiver of worker notifications.
    ///
    /// Clones share one queue: each event goes to exactly one receiver, so a
    /// controller should drain from a single place. The channel is unbounded:
    /// events accumulate until drained, and a controller that never drains
    /// grows it without limit.
    pub fn events(&self) -> Receiver<SchedulerEvent> {
        self.events_rx.clone()
    }

    /// Take the next pending notification without blocking.
    pub fn try_recv_event(&self) -> Option<SchedulerEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next notification.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SchedulerEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for CameraScheduler {
    fn drop(&mut self) {
        // Request exit but DON'T join: the worker may be inside a long device
        // call. It keeps its own Arc and releases it on the way out.
        let mut state = self.shared.state.lock();
        if state.running && !state.cancelled {
            state.cancelled = true;
            self.shared.state_changed.notify_all();
            debug!(scheduler = %self.shared.id, "scheduler dropped while running - worker will be detached");
        }
    }
}
