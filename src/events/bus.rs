use super::PackageMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, RwLock, Weak};

type Observer = Arc<dyn Fn(&PackageMessage) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    observers: RwLock<Vec<(u64, Observer)>>,
}

/// Publish/subscribe channel shared by every component in an `AppContext`.
///
/// Cloning is cheap and yields a handle to the same channel.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It stays registered until the returned
    /// `Subscription` is dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unregisters the observer immediately"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&PackageMessage) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut observers = self
            .inner
            .observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        observers.push((id, Arc::new(observer)));

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Subscribe with a channel instead of a callback; messages queue up in the receiver.
    #[must_use = "dropping the subscription unregisters the observer immediately"]
    pub fn channel(&self) -> (Subscription, mpsc::Receiver<PackageMessage>) {
        let (tx, rx) = mpsc::channel();
        let subscription = self.subscribe(move |message| {
            // Receiver gone means the caller stopped listening; nothing to do.
            let _ = tx.send(message.clone());
        });
        (subscription, rx)
    }

    /// Deliver a message to every observer registered at the time of the call.
    ///
    /// The observer list is snapshotted first, so observers may subscribe or
    /// unsubscribe from inside their callback.
    pub fn publish(&self, message: PackageMessage) {
        let snapshot: Vec<Observer> = {
            let observers = self
                .inner
                .observers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };

        for observer in snapshot {
            observer(&message);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .read()
            .map(|o| o.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Registration handle returned by [`EventBus::subscribe`].
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut observers = inner
                .observers
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            observers.retain(|(id, _)| *id != self.id);
        }
    }
}
