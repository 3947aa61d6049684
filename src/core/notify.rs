//! Fan-out of device notifications over crossbeam channels.
//!
//! Notifications are produced on the worker thread while a device call is in
//! progress. Subscribers receive them through their own channel and decide
//! on which thread to act on them, so no subscriber code ever runs inside a
//! device call.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};
use parking_lot::Mutex;
use tracing::trace;

use crate::core::DeviceNotification;

/// Handle identifying one subscription.
pub type SubscriptionId = u64;

/// Receiving side of a subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<DeviceNotification>,
}

impl Subscription {
    /// Identifier to pass back to `unsubscribe`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Channel receiver for blocking or timed receives.
    pub fn receiver(&self) -> &Receiver<DeviceNotification> {
        &self.rx
    }

    /// Iterate over notifications already delivered, without blocking.
    pub fn try_iter(&self) -> TryIter<'_, DeviceNotification> {
        self.rx.try_iter()
    }
}

/// Notification hub embedded in device implementations.
#[derive(Debug, Default)]
pub struct Notifier {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Sender<DeviceNotification>)>>,
}

impl Notifier {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// Each subscriber gets its own unbounded channel. Notifications pile up
    /// until the subscriber drains them or drops its [`Subscription`].
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = unbounded();
        self.subscribers.lock().push((id, tx));
        trace!(subscription = id, "subscribed to device notifications");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Returns `false` when `id` is not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != subscribers.len()
    }

    /// Deliver a notification to every live subscriber.
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, notification: &DeviceNotification) {
        self.subscribers
            .lock()
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
