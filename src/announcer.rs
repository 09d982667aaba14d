//! Typed publish/subscribe registry.
//!
//! Each emitting entity owns one [`Announcer`]. Listeners subscribe per
//! event kind and are delivered to synchronously, in subscription order.
//! An event knows which listener method to invoke for its kind through
//! [`Event::deliver`], so the registry never has to inspect or cast
//! listeners at runtime.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::warn;

/// Failure reported by a listener while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("listener rejected event: {0}")]
    Rejected(String),
    #[error("listener resource unavailable: {0}")]
    ResourceUnavailable(String),
}

pub type ListenerResult = Result<(), ListenerError>;

/// An event that can be routed through an [`Announcer`].
pub trait Event: fmt::Debug {
    /// Tag used as the subscription key.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send;
    /// Capability interface every subscriber for this event family implements.
    type Listener: ?Sized + Send + Sync;

    fn kind(&self) -> Self::Kind;

    /// Invoke the listener method matching this event's kind.
    fn deliver(&self, listener: &Self::Listener) -> ListenerResult;
}

/// Outcome of a single [`Announcer::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

type Registrations<E> = HashMap<<E as Event>::Kind, Vec<Arc<<E as Event>::Listener>>>;

pub struct Announcer<E: Event> {
    registrations: Mutex<Registrations<E>>,
}

impl<E: Event> Announcer<E> {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
        }
    }

    /// Append `listener` to the subscribers of `kind`. Duplicates are kept
    /// and each one is delivered to.
    pub fn subscribe(&self, kind: E::Kind, listener: Arc<E::Listener>) {
        self.registrations().entry(kind).or_default().push(listener);
    }

    /// Remove every registration of `listener` for `kind` and return how
    /// many were removed. Listeners are compared by allocation identity.
    pub fn unsubscribe(&self, kind: E::Kind, listener: &Arc<E::Listener>) -> usize {
        let mut registrations = self.registrations();
        let Some(listeners) = registrations.get_mut(&kind) else {
            return 0;
        };

        let before = listeners.len();
        listeners.retain(|current| !same_listener(current, listener));
        let removed = before - listeners.len();

        if listeners.is_empty() {
            registrations.remove(&kind);
        }
        removed
    }

    /// Deliver `event` to a snapshot of the subscribers of its kind.
    ///
    /// The registry lock is released before any listener runs, so a
    /// listener may subscribe or unsubscribe on this announcer. Such
    /// changes only affect later calls. A listener error is logged and
    /// delivery continues with the remaining subscribers.
    pub fn publish(&self, event: &E) -> DeliveryReport {
        let kind = event.kind();
        let snapshot: Vec<Arc<E::Listener>> = match self.registrations().get(&kind) {
            Some(listeners) => listeners.clone(),
            None => return DeliveryReport::default(),
        };

        let mut report = DeliveryReport::default();
        for listener in &snapshot {
            match event.deliver(listener) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(?kind, error = %e, "listener failed, continuing delivery");
                }
            }
        }
        report
    }

    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.registrations().get(&kind).map_or(0, Vec::len)
    }

    /// Whether `kind` currently has an entry in the index.
    pub fn is_registered(&self, kind: E::Kind) -> bool {
        self.registrations().contains_key(&kind)
    }

    pub fn clear(&self) {
        self.registrations().clear();
    }

    fn registrations(&self) -> MutexGuard<'_, Registrations<E>> {
        // Listeners never run under this lock, so a poisoned index is still consistent.
        self.registrations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event> Default for Announcer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Announcer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registrations = self.registrations();
        let mut map = f.debug_map();
        for (kind, listeners) in registrations.iter() {
            map.entry(kind, &listeners.len());
        }
        map.finish()
    }
}

fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    core::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
