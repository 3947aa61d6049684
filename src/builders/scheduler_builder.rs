//! Builders to construct schedulers, queues and tasks from configuration.

use std::sync::Arc;

use crate::config::{QueueBackendConfig, SchedulerConfig, TaskConfig};
use crate::core::{CameraScheduler, Device, SchedulerError, Task, TaskKind, TaskQueue};
use crate::infra::{ChannelQueue, InMemoryQueue};

/// Build a stopped scheduler for `device` from configuration.
pub fn build_scheduler(
    cfg: &SchedulerConfig,
    device: Arc<dyn Device>,
) -> Result<CameraScheduler, SchedulerError> {
    CameraScheduler::with_config(device, cfg.clone())
}

/// Build the queue backend selected by `backend`.
pub fn build_queue<T: Send + 'static>(backend: QueueBackendConfig) -> Box<dyn TaskQueue<T>> {
    match backend {
        QueueBackendConfig::InMemory => Box::new(InMemoryQueue::new()),
        QueueBackendConfig::Channel => Box::new(ChannelQueue::new()),
    }
}

/// Build a task from its machine name, e.g. `"preview"`.
pub fn build_task(name: &str, cfg: &TaskConfig) -> Result<Box<dyn Task>, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    let kind: TaskKind = name.parse().map_err(SchedulerError::InvalidConfig)?;
    Ok(kind.build(cfg))
}
