//! # Tether Scheduler
//!
//! A per-device task scheduler for tethered camera capture.
//!
//! Camera drivers are blocking: a capture or a download can take seconds, and
//! the device can only do one thing at a time. This crate gives each device a
//! dedicated worker thread and a FIFO task queue so a UI or controller thread
//! can request work without ever blocking on device I/O.
//!
//! ## Key Features
//!
//! - **One worker per device**: tasks run strictly one at a time, in enqueue order
//! - **Idle event polling**: between tasks the worker waits on the device event
//!   channel, so files written by the camera itself are picked up
//! - **Non-blocking control**: `start`, `stop`, `enqueue` never wait on the device
//! - **Notifications over channels**: task begin/end and worker exit arrive as
//!   [`SchedulerEvent`](core::SchedulerEvent)s on a crossbeam channel
//! - **Built-in tasks**: capture, preview burst, and a cancellable monitor
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether_scheduler::config::SchedulerConfig;
//! use tether_scheduler::core::{CameraScheduler, TaskKind};
//! use tether_scheduler::infra::MockDevice;
//!
//! # fn main() -> tether_scheduler::core::AppResult<()> {
//! tether_scheduler::util::init_tracing();
//!
//! let config = SchedulerConfig::from_env()?;
//! let scheduler = CameraScheduler::with_config(Arc::new(MockDevice::new()), config)?;
//! scheduler.start()?;
//! scheduler.enqueue_boxed(TaskKind::Preview.build(&scheduler.config().tasks))?;
//! # Ok(())
//! # }
//! ```
//!
//! Tests in `tests/scheduler_test.rs` exercise the full lifecycle against
//! [`MockDevice`](infra::MockDevice).

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: device contract, tasks, scheduler.
pub mod core;
/// Configuration models for the scheduler and built-in tasks.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters: queue backends and a scripted device.
pub mod infra;
/// Shared utilities.
pub mod util;
