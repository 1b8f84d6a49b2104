//! Event Bus (spec §4.1): in-process, parallel, fire-and-forget pub/sub.
//!
//! Snapshots the subscriber list under a read lock before dispatch so
//! handlers can subscribe/unsubscribe from within a handler without
//! deadlocking. Each handler runs on its own `tokio::task`; a panicking
//! handler is caught and logged, never propagated to the emitter.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sentinel_core::{Event, EventKind, Subscription};

pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`. Multiple handlers per kind are
    /// allowed; delivery order among them is unspecified.
    pub fn subscribe(&self, kind: EventKind, handler: Handler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().entry(kind).or_default().push(Entry { id, handler });
        Subscription::new(kind, id)
    }

    /// Idempotent: unsubscribing an already-removed (or never-registered)
    /// subscription is a no-op, not an error.
    pub fn unsubscribe(&self, subscription: Subscription) {
        if let Some(entries) = self.subscribers.write().get_mut(&subscription.kind()) {
            entries.retain(|e| e.id != subscription.id());
        }
    }

    /// Fans `event` out to every handler registered for its kind. Emitting
    /// with zero subscribers is a no-op. Non-blocking to the caller: each
    /// handler runs on its own spawned task.
    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        let entries: Vec<Handler> = {
            let subscribers = self.subscribers.read();
            match subscribers.get(&kind) {
                Some(entries) => entries.iter().map(|e| Arc::clone(&e.handler)).collect(),
                None => {
                    tracing::debug!(event = %kind, "emit with zero subscribers");
                    return;
                }
            }
        };

        tracing::debug!(event = %kind, subscriber_count = entries.len(), summary = %event.log_summary(), "emitting");

        let event = Arc::new(event);
        for handler in entries {
            let event = Arc::clone(&event);
            // Each handler gets its own task so a slow or panicking handler
            // can't block the emitter or its siblings. The outer task exists
            // only to observe `JoinError::is_panic()` — panics never unwind
            // back into `emit`.
            let task = tokio::spawn(async move {
                handler(&event);
            });
            tokio::spawn(async move {
                if let Err(join_err) = task.await {
                    if join_err.is_panic() {
                        tracing::error!(error = %join_err, "event handler panicked");
                    }
                }
            });
        }
    }
}
