//! Scheduler and task configuration structures.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Queue backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackendConfig {
    /// Mutex + condvar queue.
    #[default]
    InMemory,
    /// Crossbeam channel queue.
    Channel,
}

impl FromStr for QueueBackendConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_memory" => Ok(Self::InMemory),
            "channel" => Ok(Self::Channel),
            other => Err(format!("unknown queue backend `{other}`")),
        }
    }
}

/// Tuning for the built-in tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Live-view frames grabbed by a preview task.
    pub preview_frames: u32,
    /// Pause after each live-view frame, in milliseconds.
    pub preview_interval_ms: u64,
    /// Ceiling for one event wait inside a monitor task, in milliseconds.
    pub monitor_wait_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            preview_frames: 20,
            preview_interval_ms: 100,
            monitor_wait_ms: 500,
        }
    }
}

impl TaskConfig {
    /// Validate task tuning.
    pub fn validate(&self) -> Result<(), String> {
        if self.monitor_wait_ms == 0 {
            return Err("monitor_wait_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ceiling for the idle wait on the device event channel, in milliseconds.
    /// Also bounds how long the worker takes to notice `stop()`.
    pub event_wait_ms: u64,
    /// Drain leftover device events after every task.
    pub flush_after_task: bool,
    /// Worker thread name prefix.
    pub thread_name: String,
    /// Worker thread stack size in bytes; platform default when unset.
    pub thread_stack_size: Option<usize>,
    /// Queue backend selection.
    pub queue: QueueBackendConfig,
    /// Tuning for tasks built through [`crate::builders::build_task`].
    pub tasks: TaskConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            event_wait_ms: 500,
            flush_after_task: true,
            thread_name: "camera-scheduler".into(),
            thread_stack_size: None,
            queue: QueueBackendConfig::InMemory,
            tasks: TaskConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle event wait.
    #[must_use]
    pub fn with_event_wait(mut self, wait: Duration) -> Self {
        self.event_wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Select the queue backend.
    #[must_use]
    pub fn with_queue(mut self, queue: QueueBackendConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Replace the task tuning.
    #[must_use]
    pub fn with_tasks(mut self, tasks: TaskConfig) -> Self {
        self.tasks = tasks;
        self
    }

    /// Idle event wait as a duration.
    pub fn event_wait(&self) -> Duration {
        Duration::from_millis(self.event_wait_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.event_wait_ms == 0 {
            return Err("event_wait_ms must be greater than 0".into());
        }
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        self.tasks
            .validate()
            .map_err(|e| format!("tasks invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: SchedulerConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `TETHER_*` environment variables, loading a
    /// `.env` file first when one is present. Unset variables keep defaults.
    ///
    /// Recognised: `TETHER_EVENT_WAIT_MS`, `TETHER_FLUSH_AFTER_TASK`,
    /// `TETHER_THREAD_NAME`, `TETHER_QUEUE`, `TETHER_PREVIEW_FRAMES`,
    /// `TETHER_PREVIEW_INTERVAL_MS`, `TETHER_MONITOR_WAIT_MS`.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(v) = env_parse("TETHER_EVENT_WAIT_MS")? {
            cfg.event_wait_ms = v;
        }
        if let Some(v) = env_parse("TETHER_FLUSH_AFTER_TASK")? {
            cfg.flush_after_task = v;
        }
        if let Ok(name) = env::var("TETHER_THREAD_NAME") {
            cfg.thread_name = name;
        }
        if let Ok(queue) = env::var("TETHER_QUEUE") {
            cfg.queue = queue
                .parse()
                .map_err(anyhow::Error::msg)
                .context("TETHER_QUEUE")?;
        }
        if let Some(v) = env_parse("TETHER_PREVIEW_FRAMES")? {
            cfg.tasks.preview_frames = v;
        }
        if let Some(v) = env_parse("TETHER_PREVIEW_INTERVAL_MS")? {
            cfg.tasks.preview_interval_ms = v;
        }
        if let Some(v) = env_parse("TETHER_MONITOR_WAIT_MS")? {
            cfg.tasks.monitor_wait_ms = v;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn env_parse<T>(key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: `{raw}`")),
        Err(_) => Ok(None),
    }
}
