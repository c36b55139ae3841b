//! Fan-out of host notifications to live subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use super::{Notification, Subscription, SubscriptionId};

/// Broadcast point for host notifications with explicit subscribe and
/// unsubscribe.
///
/// Each subscriber gets its own unbounded channel, so a slow consumer never
/// loses a notification.
#[derive(Debug, Default)]
pub struct NotificationHub {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, mpsc::UnboundedSender<Notification>)>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push((id, tx));
        Subscription::new(id, rx)
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Deliver a notification to every live subscriber.
    ///
    /// Subscribers whose receiver has been dropped are pruned.
    pub fn publish(&self, notification: Notification) {
        self.lock()
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, mpsc::UnboundedSender<Notification>)>>
    {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
