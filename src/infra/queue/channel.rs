//! FIFO backed by an unbounded crossbeam channel.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::core::TaskQueue;

/// Channel queue. The queue owns both ends, so the channel never disconnects
/// while the queue is alive.
pub struct ChannelQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> ChannelQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }
}

impl<T> Default for ChannelQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> TaskQueue<T> for ChannelQueue<T> {
    fn push(&self, item: T) {
        // Unbounded and we hold the receiver: send cannot fail.
        let _ = self.tx.send(item);
    }

    fn pop(&self) -> T {
        loop {
            if let Ok(item) = self.rx.recv() {
                return item;
            }
        }
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    fn len(&self) -> usize {
        self.rx.len()
    }

    fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order_across_threads() {
        let q = Arc::new(ChannelQueue::new());
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..100 {
                    q.push(i);
                }
            })
        };
        producer.join().unwrap();

        let received: Vec<_> = (0..100).map(|_| q.pop()).collect();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_len_and_drain() {
        let q = ChannelQueue::new();
        q.push("a");
        q.push("b");
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain(), vec!["a", "b"]);
        assert!(q.is_empty());
        assert_eq!(q.pop_timeout(Duration::from_millis(5)), None);
    }
}
