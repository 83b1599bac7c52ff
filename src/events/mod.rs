//! Application-scoped event bus.
//!
//! Publishers do not hold references to the components that react; they
//! publish an `AppEvent` and every subscribed observer runs. `publish`
//! resolves once all observers have finished.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    /// The signed-in user's profile (name, picture) changed on the server
    ProfileUpdated,
}

#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Observer name for logging
    fn name(&self) -> &'static str;

    fn applies_to(&self, _event: AppEvent) -> bool {
        true
    }

    /// Observers handle their own failures; nothing is returned.
    async fn on_event(&self, event: AppEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn EventObserver>)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!("Observer '{}' subscribed", observer.name());
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, observer));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub async fn publish(&self, event: AppEvent) {
        // Snapshot so observers may (un)subscribe while handling the event
        let targets: Vec<Arc<dyn EventObserver>> = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, observer)| observer.applies_to(event))
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        tracing::debug!("Publishing {:?} to {} observer(s)", event, targets.len());
        join_all(targets.iter().map(|observer| observer.on_event(event))).await;
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
