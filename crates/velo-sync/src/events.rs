//! Sync lifecycle events and observer registration.

use crate::{ChangeSummary, SyncConflict};

/// Events emitted at well-defined points of the sync state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A sync attempt began.
    Started,
    /// A quantity divergence was found during the merge.
    ConflictDetected(SyncConflict),
    /// The attempt concluded successfully.
    Completed {
        /// What the merge changed.
        summary: ChangeSummary,
        /// Number of conflicts that were auto-resolved.
        conflicts: usize,
    },
    /// The attempt failed.
    Failed(String),
}

/// Receives sync lifecycle events.
pub trait SyncObserver: Send + Sync {
    /// Called synchronously for each event.
    fn on_sync_event(&self, event: &SyncEvent);
}

/// Ordered observer list.
///
/// Observers are invoked synchronously, in registration order, at most
/// once per event.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn SyncObserver>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer at the end of the invocation order.
    pub fn register(&mut self, observer: Box<dyn SyncObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether any observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver an event to every observer, in registration order.
    pub fn notify(&self, event: &SyncEvent) {
        for observer in &self.observers {
            observer.on_sync_event(event);
        }
    }
}
