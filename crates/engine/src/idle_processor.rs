//! Idle Processor (spec §4.6): background per-entity work (technical
//! indicator recompute, stale-security sync, tag refresh) that only runs
//! while the main processor is quiet, one unit at a time so incoming
//! high-priority work always preempts it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sentinel_adapters::{AdapterError, IdleWorkProvider, SecurityRepository};
use sentinel_core::{Clock, Event, IdleProcessorConfig};

use crate::bus::EventBus;
use crate::processor::QueueSizeSource;

/// Strict priority order the spec names: `technical > sync > tags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleKind {
    Technical,
    Sync,
    Tags,
}

impl IdleKind {
    const ORDER: [IdleKind; 3] = [IdleKind::Technical, IdleKind::Sync, IdleKind::Tags];

    fn work_id(self) -> &'static str {
        match self {
            IdleKind::Technical => "idle:technical",
            IdleKind::Sync => "idle:sync",
            IdleKind::Tags => "idle:tags",
        }
    }
}

/// Per-kind counters of units completed, for diagnostics/tests.
#[derive(Default)]
pub struct IdleCounters {
    technical: AtomicU64,
    sync: AtomicU64,
    tags: AtomicU64,
}

impl IdleCounters {
    fn record(&self, kind: IdleKind) {
        match kind {
            IdleKind::Technical => self.technical.fetch_add(1, Ordering::SeqCst),
            IdleKind::Sync => self.sync.fetch_add(1, Ordering::SeqCst),
            IdleKind::Tags => self.tags.fetch_add(1, Ordering::SeqCst),
        };
    }

    pub fn count(&self, kind: IdleKind) -> u64 {
        match kind {
            IdleKind::Technical => self.technical.load(Ordering::SeqCst),
            IdleKind::Sync => self.sync.load(Ordering::SeqCst),
            IdleKind::Tags => self.tags.load(Ordering::SeqCst),
        }
    }
}

pub struct IdleProcessor<C: Clock> {
    queue: Arc<dyn QueueSizeSource>,
    securities: Arc<dyn SecurityRepository>,
    work: Arc<dyn IdleWorkProvider>,
    bus: Arc<EventBus>,
    clock: C,
    config: IdleProcessorConfig,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
    counters: IdleCounters,
}

impl<C: Clock> IdleProcessor<C> {
    pub fn new(
        queue: Arc<dyn QueueSizeSource>,
        securities: Arc<dyn SecurityRepository>,
        work: Arc<dyn IdleWorkProvider>,
        bus: Arc<EventBus>,
        clock: C,
        config: IdleProcessorConfig,
    ) -> Self {
        Self {
            queue,
            securities,
            work,
            bus,
            clock,
            config,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
            counters: IdleCounters::default(),
        }
    }

    pub fn counters(&self) -> &IdleCounters {
        &self.counters
    }

    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.handle.lock() = Some(handle);
    }

    async fn run_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.cancel.cancelled() => break,
            }
            if self.cancel.is_cancelled() {
                break;
            }
            self.process_one().await;
        }
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Spec §4.6 `ProcessOne`: at most one unit of work, yielding to the
    /// main queue whenever it is busy.
    pub async fn process_one(&self) -> bool {
        if self.queue.queue_size() >= self.config.idle_queue_threshold {
            return false;
        }

        let entities = match self.securities.active_securities().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "idle processor: failed to load active securities");
                return false;
            }
        };

        for kind in IdleKind::ORDER {
            for security in &entities {
                match self.needs_work(kind, &security.isin).await {
                    Ok(true) => {
                        self.execute_one(kind, &security.isin).await;
                        return true;
                    }
                    Ok(false) => continue,
                    Err(e) => {
                        tracing::warn!(isin = %security.isin, kind = ?kind, error = %e, "idle needs-work check failed");
                        continue;
                    }
                }
            }
        }

        false
    }

    async fn needs_work(&self, kind: IdleKind, isin: &str) -> Result<bool, AdapterError> {
        match kind {
            IdleKind::Technical => self.work.needs_technical_refresh(isin).await,
            IdleKind::Sync => self.work.needs_sync(isin).await,
            IdleKind::Tags => self.work.needs_tag_refresh(isin).await,
        }
    }

    async fn execute_one(&self, kind: IdleKind, isin: &str) {
        let module = "idle_processor".to_string();
        let work_id = sentinel_core::WorkId::new(kind.work_id());
        let subject = sentinel_core::SubjectId::new(isin);
        let now = self.clock.epoch_secs();

        self.bus.emit(Event::JobStarted {
            module: module.clone(),
            timestamp: now,
            work_id: work_id.clone(),
            subject: subject.clone(),
        });

        let start = self.clock.now();
        let result = match kind {
            IdleKind::Technical => self.work.refresh_technical(isin).await,
            IdleKind::Sync => self.work.sync_security(isin).await,
            IdleKind::Tags => self.work.refresh_tags(isin).await,
        };
        let duration_ms = self.clock.now().saturating_duration_since(start).as_millis() as u64;

        match result {
            Ok(()) => {
                self.counters.record(kind);
                self.bus.emit(Event::JobCompleted {
                    module,
                    timestamp: self.clock.epoch_secs(),
                    work_id,
                    subject,
                    duration_ms,
                });
                tracing::debug!(isin, kind = ?kind, "idle unit completed");
            }
            Err(e) => {
                // Logged, not propagated: subsequent ProcessOne calls must
                // still be free to try other units/entities (spec §4.6).
                self.bus.emit(Event::JobFailed {
                    module,
                    timestamp: self.clock.epoch_secs(),
                    work_id,
                    subject,
                    error_message: e.to_string(),
                    duration_ms,
                });
                tracing::warn!(isin, kind = ?kind, error = %e, "idle unit failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::fakes::{FakeIdleWorkProvider, FakePortfolioRepository};
    use sentinel_adapters::domain::{PortfolioState, Security};
    use sentinel_core::FakeClock;
    use std::time::Duration;

    struct FixedQueueSize(usize);
    impl QueueSizeSource for FixedQueueSize {
        fn queue_size(&self) -> usize {
            self.0
        }
    }

    fn securities_with(isins: &[&str]) -> Arc<FakePortfolioRepository> {
        Arc::new(FakePortfolioRepository::new(PortfolioState {
            active_securities: isins
                .iter()
                .map(|isin| Security {
                    isin: isin.to_string(),
                    symbol: isin.to_string(),
                    exchange: "XMIL".to_string(),
                    active: true,
                })
                .collect(),
            ..Default::default()
        }))
    }

    fn idle_processor(
        queue_size: usize,
        securities: Arc<FakePortfolioRepository>,
        work: Arc<FakeIdleWorkProvider>,
    ) -> IdleProcessor<FakeClock> {
        IdleProcessor::new(
            Arc::new(FixedQueueSize(queue_size)),
            securities,
            work,
            Arc::new(EventBus::new()),
            FakeClock::new(),
            IdleProcessorConfig { idle_queue_threshold: 2, tick_interval: Duration::from_secs(30) },
        )
    }

    #[tokio::test]
    async fn yields_when_main_queue_is_busy() {
        let work = Arc::new(FakeIdleWorkProvider::default());
        work.mark_needs_technical("IT1");
        let p = idle_processor(5, securities_with(&["IT1"]), work);

        assert!(!p.process_one().await);
    }

    #[tokio::test]
    async fn processes_exactly_one_unit_in_priority_order() {
        let work = Arc::new(FakeIdleWorkProvider::default());
        work.mark_needs_sync("IT1");
        work.mark_needs_technical("IT1");
        let p = idle_processor(0, securities_with(&["IT1"]), work.clone());

        assert!(p.process_one().await);
        assert_eq!(p.counters().count(IdleKind::Technical), 1);
        assert_eq!(p.counters().count(IdleKind::Sync), 0);
    }

    #[tokio::test]
    async fn returns_false_when_nothing_needs_work() {
        let work = Arc::new(FakeIdleWorkProvider::default());
        let p = idle_processor(0, securities_with(&["IT1"]), work);

        assert!(!p.process_one().await);
    }
}
