//! Worker thread body.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::events::wait_for_events;
use crate::core::TaskInfo;

use super::{QueuedTask, SchedulerEvent, Shared, StopReason, TaskOutcome};

/// Entry point of the worker thread. Owns one `Arc` of the shared state,
/// released when this function returns.
pub(super) fn run(shared: Arc<Shared>) {
    info!(scheduler = %shared.id, "camera scheduler worker active");
    let reason = drive(&shared);
    finish(&shared, reason);
}

/// The scheduling loop. Queued work always goes before idle event polling.
fn drive(shared: &Shared) -> StopReason {
    let device = shared.device.as_ref();

    loop {
        if shared.is_cancelled() {
            return StopReason::Requested;
        }
        if !device.is_connected() {
            return StopReason::Disconnected;
        }

        while !shared.is_cancelled() {
            let Some(queued) = shared.queue.try_pop() else {
                break;
            };
            run_task(shared, queued);

            if !device.is_connected() {
                return StopReason::Disconnected;
            }
            if shared.config.flush_after_task {
                debug!(scheduler = %shared.id, "flushing events");
                if let Err(e) = device.flush_events() {
                    warn!(scheduler = %shared.id, error = %e, "failed to flush events");
                }
            }
        }

        if let Err(e) = wait_for_events(device, shared.config.event_wait()) {
            if !device.is_connected() {
                info!(scheduler = %shared.id, error = %e, "device disconnected while waiting for events");
                return StopReason::Disconnected;
            }
            error!(scheduler = %shared.id, error = %e, "failed when waiting for events");
            return StopReason::EventChannelFailed(e.to_string());
        }

        park_if_paused(shared);
    }
}

fn run_task(shared: &Shared, queued: QueuedTask) {
    let QueuedTask { id, task } = queued;
    let info = TaskInfo::of(id, task.as_ref());

    debug!(scheduler = %shared.id, task_id = id, task = %info.name, "running task");
    shared.emit(SchedulerEvent::TaskBegin { task: info.clone() });

    let result = panic::catch_unwind(AssertUnwindSafe(|| task.execute(shared.device.as_ref())));
    let outcome = match result {
        Ok(Ok(())) => {
            shared.counters.completed.fetch_add(1, Ordering::Relaxed);
            TaskOutcome::Succeeded
        }
        Ok(Err(e)) => {
            debug!(scheduler = %shared.id, task_id = id, error = %e, "task failed");
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            TaskOutcome::Failed(e.to_string())
        }
        Err(_) => {
            error!(scheduler = %shared.id, task_id = id, "task panicked");
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            TaskOutcome::Failed("task panicked".into())
        }
    };

    shared.emit(SchedulerEvent::TaskEnd { task: info, outcome });
    debug!(scheduler = %shared.id, task_id = id, "finished task");
}

fn park_if_paused(shared: &Shared) {
    let mut state = shared.state.lock();

    // A pause requested while parked re-parks once the resume is seen, so
    // pause() never returns while the worker is on its way out.
    while state.pause_requested && !state.cancelled {
        state.pause_requested = false;
        state.paused = true;
        state.resume = false;
        shared.state_changed.notify_all();
        debug!(scheduler = %shared.id, "paused, waiting for resume");

        while !state.resume && !state.cancelled {
            shared.state_changed.wait(&mut state);
        }
        state.paused = false;
        state.resume = false;
        debug!(scheduler = %shared.id, "resumed");
    }
}

/// Mark the scheduler stopped and purge whatever is still queued.
fn finish(shared: &Shared, reason: StopReason) {
    let discarded = {
        let mut state = shared.state.lock();
        state.running = false;
        state.paused = false;
        state.pause_requested = false;
        let discarded = shared.queue.drain();
        shared.emit(SchedulerEvent::Stopped {
            reason: reason.clone(),
        });
        shared.state_changed.notify_all();
        discarded
    };

    shared
        .counters
        .discarded
        .fetch_add(discarded.len() as u64, Ordering::Relaxed);
    info!(
        scheduler = %shared.id,
        discarded = discarded.len(),
        reason = ?reason,
        "camera scheduler worker quit"
    );
}
