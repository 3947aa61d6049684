//! In-memory FIFO built on a `parking_lot` mutex and condition variable.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::TaskQueue;

/// Mutex + Condvar queue. `pop` sleeps on the condvar instead of polling.
pub struct InMemoryQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> InMemoryQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }
}

impl<T> Default for InMemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> TaskQueue<T> for InMemoryQueue<T> {
    fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.available.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }

    fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let q = InMemoryQueue::new();
        for i in 0..5 {
            q.push(i);
        }
        assert_eq!(q.len(), 5);
        assert_eq!((0..5).map(|_| q.pop()).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let q = Arc::new(InMemoryQueue::new());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(20));
        q.push("capture");
        assert_eq!(consumer.join().unwrap(), "capture");
    }

    #[test]
    fn test_pop_timeout_on_empty() {
        let q = InMemoryQueue::<u32>::new();
        let start = Instant::now();
        assert_eq!(q.pop_timeout(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_discard_all() {
        let q = InMemoryQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.discard_all(), 3);
        assert_eq!(q.try_pop(), None);
    }
}
