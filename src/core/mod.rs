//! Core scheduling abstractions: device contract, tasks, queue, scheduler.

pub mod device;
pub mod error;
pub mod events;
pub mod notify;
pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use device::{Device, DeviceEvent, DeviceFile, DeviceNotification, FLUSH_POLL};
pub use error::{AppResult, DeviceError, SchedulerError};
pub use notify::{Notifier, Subscription, SubscriptionId};
pub use progress::{ChannelProgress, Progress, ProgressEvent};
pub use queue::TaskQueue;
pub use scheduler::{CameraScheduler, SchedulerEvent, SchedulerStats, StopReason, TaskOutcome};
pub use task::{CaptureTask, MonitorTask, PreviewTask, Task, TaskId, TaskInfo, TaskKind};
