//! Publish-subscribe bus for cross-store signaling.
//!
//! Logout and navigation are broadcast here so that any number of
//! listeners (cart, navigation shell) can react independently. Delivery
//! order between subscribers is unspecified and must not be relied upon;
//! each subscriber's reaction has to be self-contained.

use std::sync::{Arc, Mutex, PoisonError};

/// Events broadcast between storefront components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The session ended. The cart clears itself; the navigation shell
    /// redirects itself.
    LoggedOut,
    /// The UI shell should move to the given path.
    Navigate(String),
}

type Subscriber = Arc<dyn Fn(&AppEvent) + Send + Sync>;

/// In-process publish-subscribe bus.
///
/// Cheaply cloneable; clones share the same subscriber list. Subscribers
/// are invoked on the publisher's call stack, fire-and-forget.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for all events.
    ///
    /// Subscribers filter for the events they care about; there is no
    /// per-topic registration.
    pub fn subscribe(&self, subscriber: impl Fn(&AppEvent) + Send + Sync + 'static) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }

    /// Broadcast an event to every subscriber.
    pub fn publish(&self, event: &AppEvent) {
        // Snapshot under the lock so a subscriber may publish or subscribe
        // without deadlocking.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::debug!(?event, count = subscribers.len(), "publishing event");
        for subscriber in subscribers {
            subscriber(event);
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
