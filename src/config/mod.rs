//! Configuration models for the scheduler, its queue backend, and tasks.

pub mod scheduler;

pub use scheduler::{QueueBackendConfig, SchedulerConfig, TaskConfig};
