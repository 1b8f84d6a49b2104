//! Event triggers the processor registers (spec §4.7): reactions to
//! `StateChanged`/`RecommendationsReady`/`MarketsStatusChanged`/
//! `DividendDetected` that invalidate the relevant run-cache prefix and
//! wake the processor. Wired once at startup by `sentinel-daemon`'s
//! runtime, not something individual work units touch.

use std::sync::Arc;

use sentinel_core::EventKind;

use crate::bus::EventBus;
use crate::cache::RunCache;
use crate::processor::Triggerable;

/// Subscribes the four reactions spec.md §4.7 names. Returns nothing: the
/// subscriptions live for the bus's lifetime, mirroring how the teacher
/// wires its own runtime-level event reactions once at construction and
/// never unsubscribes them.
pub fn install(bus: &EventBus, cache: Arc<RunCache>, processor: Arc<dyn Triggerable>) {
    let planner_cache = Arc::clone(&cache);
    let planner_processor = Arc::clone(&processor);
    bus.subscribe(
        EventKind::StateChanged,
        Arc::new(move |_event| {
            let removed = planner_cache.delete_prefix("planner:");
            tracing::debug!(removed, "state changed: cleared planner cache prefix");
            planner_processor.trigger();
        }),
    );

    let ready_processor = Arc::clone(&processor);
    bus.subscribe(
        EventKind::RecommendationsReady,
        Arc::new(move |_event| {
            ready_processor.trigger();
        }),
    );

    let markets_processor = Arc::clone(&processor);
    bus.subscribe(
        EventKind::MarketsStatusChanged,
        Arc::new(move |_event| {
            markets_processor.trigger();
        }),
    );

    let dividend_cache = Arc::clone(&cache);
    let dividend_processor = Arc::clone(&processor);
    bus.subscribe(
        EventKind::DividendDetected,
        Arc::new(move |_event| {
            let removed = dividend_cache.delete_prefix("dividend:");
            tracing::debug!(removed, "dividend detected: cleared dividend cache prefix");
            dividend_processor.trigger();
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{Event, StateHash};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingTrigger(AtomicUsize);

    impl Triggerable for CountingTrigger {
        fn trigger(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn state_changed_clears_planner_prefix_and_triggers() {
        let bus = EventBus::new();
        let cache = Arc::new(RunCache::new());
        cache.set("planner:weights", 1u32);
        let trigger = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        install(&bus, Arc::clone(&cache), Arc::clone(&trigger) as Arc<dyn Triggerable>);

        bus.emit(Event::StateChanged {
            module: "test".into(),
            timestamp: 0,
            old_hash: StateHash::empty(),
            new_hash: StateHash::empty(),
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!cache.has("planner:weights"));
        assert_eq!(trigger.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dividend_detected_clears_dividend_prefix_and_triggers() {
        let bus = EventBus::new();
        let cache = Arc::new(RunCache::new());
        cache.set("dividend:detected", 1u32);
        let trigger = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        install(&bus, Arc::clone(&cache), Arc::clone(&trigger) as Arc<dyn Triggerable>);

        bus.emit(Event::DividendDetected {
            module: "test".into(),
            timestamp: 0,
            isin: "IT1".into(),
            amount_minor: 100,
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!cache.has("dividend:detected"));
        assert_eq!(trigger.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recommendations_ready_and_markets_status_just_trigger() {
        let bus = EventBus::new();
        let cache = Arc::new(RunCache::new());
        let trigger = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        install(&bus, cache, Arc::clone(&trigger) as Arc<dyn Triggerable>);

        bus.emit(Event::RecommendationsReady { module: "test".into(), timestamp: 0, count: 1 });
        bus.emit(Event::MarketsStatusChanged { module: "test".into(), timestamp: 0, open_markets: vec![] });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(trigger.0.load(Ordering::SeqCst), 2);
    }
}
