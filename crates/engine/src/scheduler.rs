//! Time Scheduler (spec §4.8): a coarse per-minute scan that asks the
//! processor to re-evaluate once any interval-based work type's bucket has
//! rolled over. It owns no queue — "enqueue" means "request a tick,"
//! de-duplicated by `Trigger()`'s own coalescing.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sentinel_core::SchedulerConfig;

use crate::processor::Triggerable;

pub struct Scheduler {
    processor: Arc<dyn Triggerable>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Time-based work types themselves are configured at construction of
    /// the registry (each `WorkType` carries its own `interval`); the
    /// scheduler's only job is to wake the processor often enough for
    /// `JobHistoryStore::should_run` to be checked against every interval
    /// in the registry, which a per-minute scan satisfies for the
    /// hourly/daily/weekly/monthly granularities spec.md names.
    pub fn new(processor: Arc<dyn Triggerable>, config: SchedulerConfig) -> Self {
        Self { processor, config, cancel: CancellationToken::new(), handle: Mutex::new(None) }
    }

    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.handle.lock() = Some(handle);
    }

    async fn run_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.scan_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.cancel.cancelled() => break,
            }
            if self.cancel.is_cancelled() {
                break;
            }
            // A single `Trigger()` per scan is enough: the processor's own
            // discovery pass re-checks every registered type's interval via
            // `JobHistoryStore::should_run`, so "enqueue hourly/daily/..."
            // reduces to "wake the processor and let it re-derive eligibility."
            self.processor.trigger();
        }
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingTrigger(AtomicUsize);

    impl Triggerable for CountingTrigger {
        fn trigger(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scans_on_the_configured_interval() {
        let counter = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&counter) as Arc<dyn Triggerable>,
            SchedulerConfig { scan_interval: Duration::from_secs(60) },
        ));
        scheduler.start();

        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);

        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_awaits_the_task() {
        let counter = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&counter) as Arc<dyn Triggerable>,
            SchedulerConfig { scan_interval: Duration::from_secs(60) },
        ));
        scheduler.start();
        scheduler.stop().await;
        scheduler.stop().await;
    }
}
