//! Queue abstraction shared by the scheduler and its backends.

use std::time::Duration;

/// Thread-safe, unbounded FIFO of pending work.
///
/// Producers may push from any thread and never block. The scheduler's worker
/// is the single consumer, so an item is observed by exactly one `pop`.
pub trait TaskQueue<T>: Send + Sync {
    /// Append an item at the tail.
    fn push(&self, item: T);
    /// Remove the head, blocking until an item is available.
    fn pop(&self) -> T;
    /// Remove the head, waiting at most `timeout`.
    fn pop_timeout(&self, timeout: Duration) -> Option<T>;
    /// Remove the head if one is present.
    fn try_pop(&self) -> Option<T>;
    /// Current depth.
    fn len(&self) -> usize;
    /// Remove every queued item, in FIFO order.
    fn drain(&self) -> Vec<T>;

    /// Whether the queue holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every queued item without handing it to a consumer.
    /// Returns how many were dropped.
    fn discard_all(&self) -> usize {
        self.drain().len()
    }
}
