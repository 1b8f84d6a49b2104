//! Work Processor (spec §4.5): the main engine. Discovers runnable
//! `(work_type, subject)` pairs in registration + dependency order,
//! executes them respecting market timing, and repeats until a tick
//! reaches a fixpoint (one full pass with no new executions).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sentinel_core::{Clock, Event, ProcessorConfig, SubjectId, WorkError, WorkId};
use sentinel_storage::{JobHistoryStore, JobStatus};

use crate::bus::EventBus;
use crate::cache::RunCache;
use crate::market_timing_checker::MarketTimingChecker;
use crate::progress::ProgressReporter;
use crate::registry::{WorkContext, WorkRegistry, WorkType};

/// `Idle -> Ticking -> Idle`; `Idle -> Stopping -> Stopped` (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Idle,
    Ticking,
    Stopping,
    Stopped,
}

/// Lets the Idle Processor read the main queue's reported size without
/// depending on `WorkProcessor`'s concrete type (spec §4.6 step 1).
pub trait QueueSizeSource: Send + Sync {
    fn queue_size(&self) -> usize;
}

/// Lets the Scheduler request a tick without depending on
/// `WorkProcessor<C>`'s generic clock parameter.
pub trait Triggerable: Send + Sync {
    fn trigger(&self);
}

pub struct WorkProcessor<C: Clock> {
    registry: Arc<WorkRegistry>,
    cache: Arc<RunCache>,
    job_history: Arc<dyn JobHistoryStore>,
    market_timing: Arc<MarketTimingChecker>,
    bus: Arc<EventBus>,
    clock: C,
    config: ProcessorConfig,
    notify: Notify,
    cancel: CancellationToken,
    state: Mutex<ProcessorState>,
    pending_subject_count: AtomicUsize,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> WorkProcessor<C> {
    pub fn new(
        registry: Arc<WorkRegistry>,
        cache: Arc<RunCache>,
        job_history: Arc<dyn JobHistoryStore>,
        market_timing: Arc<MarketTimingChecker>,
        bus: Arc<EventBus>,
        clock: C,
        config: ProcessorConfig,
    ) -> Self {
        // Spec §3 invariants ("every depends_on id is itself registered",
        // no implicit cycle). Caught once at construction and logged rather
        // than failing startup: a misconfigured dependent simply never
        // becomes eligible (§4.5 step 2d), so this is diagnostic, not fatal.
        if let Err(e) = registry.validate() {
            tracing::error!(error = %e, "work registry failed validation");
        }

        Self {
            registry,
            cache,
            job_history,
            market_timing,
            bus,
            clock,
            config,
            notify: Notify::new(),
            cancel: CancellationToken::new(),
            state: Mutex::new(ProcessorState::Idle),
            pending_subject_count: AtomicUsize::new(0),
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProcessorState {
        *self.state.lock()
    }

    pub fn run_cache(&self) -> Arc<RunCache> {
        Arc::clone(&self.cache)
    }

    /// Non-blocking wake-up. Coalesces: `tokio::sync::Notify` stores at
    /// most one unconsumed permit, so N calls between ticks (or during one)
    /// collapse into exactly one additional tick (spec §8).
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Spawns the tick loop as a background task and keeps its
    /// `JoinHandle`, so `stop()` can await the in-flight tick to completion.
    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.handle.lock() = Some(handle);
    }

    /// Blocking main loop (spec §4.5 `Run(context)`). Exits once `stop()`
    /// cancels the token and the current tick (if any) has finished.
    pub async fn run_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = self.cancel.cancelled() => break,
            }
            if self.cancel.is_cancelled() {
                break;
            }
            self.tick().await;
        }
        *self.state.lock() = ProcessorState::Stopped;
    }

    /// Cooperative shutdown: cancels the token, wakes a waiting loop if
    /// idle, and awaits the in-flight tick (if any) before returning.
    pub async fn stop(&self) {
        *self.state.lock() = ProcessorState::Stopping;
        self.cancel.cancel();
        self.notify.notify_one();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Number of discovered-but-not-yet-executed subjects from the most
    /// recent tick's discovery pass (spec §4.6: "main work queue's reported
    /// size").
    pub fn queue_size(&self) -> usize {
        self.pending_subject_count.load(Ordering::SeqCst)
    }

    /// One full activation: discovery, then fixpoint execution passes
    /// (spec §4.5 steps 1-5).
    async fn tick(&self) {
        *self.state.lock() = ProcessorState::Ticking;

        let now = self.clock.epoch_secs();
        let all_types = self.registry.all();
        let ctx = WorkContext { cache: Arc::clone(&self.cache), now_epoch: now };

        let mut subjects: HashMap<WorkId, Vec<SubjectId>> = HashMap::new();
        let mut attempted: HashSet<WorkId> = HashSet::new();
        let mut succeeded: HashSet<WorkId> = HashSet::new();

        // Discovery: find_subjects() is called at most once per tick,
        // before any execution (spec §8).
        for wt in &all_types {
            if let Some(interval) = wt.interval {
                if !self.job_history.should_run(wt.id.as_str(), interval.as_secs(), now) {
                    attempted.insert(wt.id.clone());
                    succeeded.insert(wt.id.clone());
                    continue;
                }
            }

            let found = wt.handler.find_subjects(&ctx).await;
            let mut eligible = Vec::with_capacity(found.len());
            for subject in found {
                if self.market_timing.can_execute(wt.market_timing, &subject, now).await {
                    eligible.push(subject);
                }
            }
            if eligible.is_empty() {
                // Precondition skip: nothing to do, not an error. Treated as
                // vacuously satisfied for any dependent's ordering check.
                attempted.insert(wt.id.clone());
                succeeded.insert(wt.id.clone());
            }
            subjects.insert(wt.id.clone(), eligible);
        }

        self.pending_subject_count
            .store(subjects.values().map(Vec::len).sum(), Ordering::SeqCst);

        // Execution: repeat passes until one produces no new executions.
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let mut executed_this_pass = false;

            for wt in &all_types {
                if attempted.contains(&wt.id) {
                    continue;
                }
                if !wt.depends_on.iter().all(|dep| succeeded.contains(dep)) {
                    continue;
                }

                let subs = subjects.remove(&wt.id).unwrap_or_default();
                let mut any_failed = false;
                for subject in subs {
                    if self.cancel.is_cancelled() {
                        any_failed = true;
                        break;
                    }
                    let ok = self.execute_with_retry(wt, subject, &ctx).await;
                    self.pending_subject_count.fetch_sub(1, Ordering::SeqCst);
                    if !ok {
                        any_failed = true;
                    }
                    executed_this_pass = true;
                }
                attempted.insert(wt.id.clone());
                if !any_failed {
                    succeeded.insert(wt.id.clone());
                }
            }

            if !executed_this_pass {
                break;
            }
        }

        *self.state.lock() = ProcessorState::Idle;
    }

    /// Executes one subject with bounded exponential-backoff retry for
    /// transient errors. Returns whether it ultimately succeeded — used by
    /// `tick` to decide whether dependents may proceed (spec §8 scenario 3:
    /// "if a.execute returns an error, b.execute is not called").
    async fn execute_with_retry(&self, wt: &WorkType, subject: SubjectId, ctx: &WorkContext) -> bool {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return false;
            }

            let module = wt.id.domain().to_string();
            let started_at = self.clock.epoch_secs();
            self.bus.emit(Event::JobStarted {
                module: module.clone(),
                timestamp: started_at,
                work_id: wt.id.clone(),
                subject: subject.clone(),
            });
            tracing::info!(work_id = %wt.id, subject = %subject, attempt, "job started");

            let progress =
                ProgressReporter::new(Arc::clone(&self.bus), module.clone(), wt.id.clone(), subject.clone(), started_at);
            let handler = Arc::clone(&wt.handler);
            let cancel = self.cancel.clone();
            let ctx = ctx.clone();
            let task_subject = subject.clone();
            let start = self.clock.now();

            let join_result =
                tokio::spawn(async move { handler.execute(&ctx, &task_subject, &progress, &cancel).await }).await;

            let duration_ms = self.clock.now().saturating_duration_since(start).as_millis() as u64;

            match join_result {
                Ok(Ok(())) => {
                    self.bus.emit(Event::JobCompleted {
                        module,
                        timestamp: self.clock.epoch_secs(),
                        work_id: wt.id.clone(),
                        subject: subject.clone(),
                        duration_ms,
                    });
                    let _ = self.job_history.record_execution(wt.id.as_str(), self.clock.epoch_secs(), JobStatus::Success);
                    tracing::info!(work_id = %wt.id, subject = %subject, duration_ms, "job completed");
                    return true;
                }
                Ok(Err(WorkError::Cancelled)) => {
                    self.bus.emit(Event::JobFailed {
                        module,
                        timestamp: self.clock.epoch_secs(),
                        work_id: wt.id.clone(),
                        subject: subject.clone(),
                        error_message: "cancelled".to_string(),
                        duration_ms,
                    });
                    let _ = self.job_history.record_execution(wt.id.as_str(), self.clock.epoch_secs(), JobStatus::Failed);
                    tracing::warn!(work_id = %wt.id, subject = %subject, "job cancelled");
                    return false;
                }
                Ok(Err(e)) if e.is_retryable() && attempt < self.config.max_retries => {
                    tracing::warn!(work_id = %wt.id, subject = %subject, attempt, error = %e, "transient error, retrying");
                    tokio::time::sleep(self.config.backoff_for_attempt(attempt)).await;
                    continue;
                }
                Ok(Err(e)) => {
                    self.bus.emit(Event::JobFailed {
                        module,
                        timestamp: self.clock.epoch_secs(),
                        work_id: wt.id.clone(),
                        subject: subject.clone(),
                        error_message: e.reason(),
                        duration_ms,
                    });
                    let _ = self.job_history.record_execution(wt.id.as_str(), self.clock.epoch_secs(), JobStatus::Failed);
                    tracing::error!(work_id = %wt.id, subject = %subject, error = %e, "job failed");
                    return false;
                }
                Err(join_err) => {
                    let e = WorkError::Panic(panic_message(join_err));
                    self.bus.emit(Event::JobFailed {
                        module,
                        timestamp: self.clock.epoch_secs(),
                        work_id: wt.id.clone(),
                        subject: subject.clone(),
                        error_message: e.reason(),
                        duration_ms,
                    });
                    let _ = self.job_history.record_execution(wt.id.as_str(), self.clock.epoch_secs(), JobStatus::Failed);
                    tracing::error!(work_id = %wt.id, subject = %subject, error = %e, "job panicked");
                    return false;
                }
            }
        }
    }
}

impl<C: Clock> QueueSizeSource for WorkProcessor<C> {
    fn queue_size(&self) -> usize {
        self.queue_size()
    }
}

impl<C: Clock> Triggerable for WorkProcessor<C> {
    fn trigger(&self) {
        self.trigger()
    }
}

/// Extracts a human-readable message from a panic payload, mirroring the
/// common `&str`/`String` panic-payload shapes `std::panic::catch_unwind`
/// produces (spec §9: panics are caught at the work-unit boundary).
fn panic_message(join_err: tokio::task::JoinError) -> String {
    match join_err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            }
        }
        Err(_) => "task cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_adapters::fakes::FakeMarketHours;
    use sentinel_core::{FakeClock, MarketTiming, WorkId};
    use sentinel_storage::InMemoryJobHistoryStore;
    use std::sync::atomic::AtomicU32;
    use tokio_util::sync::CancellationToken as Cancel;

    use crate::registry::{WorkHandler, WorkType};

    struct RecordingHandler {
        subjects: Vec<SubjectId>,
        calls: Arc<AtomicU32>,
        fail_until: u32,
    }

    #[async_trait]
    impl WorkHandler for RecordingHandler {
        async fn find_subjects(&self, _ctx: &WorkContext) -> Vec<SubjectId> {
            self.subjects.clone()
        }

        async fn execute(
            &self,
            _ctx: &WorkContext,
            _subject: &SubjectId,
            _progress: &ProgressReporter,
            _cancel: &Cancel,
        ) -> Result<(), WorkError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_until {
                Err(WorkError::Transient("not yet".into()))
            } else {
                Ok(())
            }
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl WorkHandler for FailingHandler {
        async fn find_subjects(&self, _ctx: &WorkContext) -> Vec<SubjectId> {
            vec![SubjectId::global()]
        }

        async fn execute(
            &self,
            _ctx: &WorkContext,
            _subject: &SubjectId,
            _progress: &ProgressReporter,
            _cancel: &Cancel,
        ) -> Result<(), WorkError> {
            Err(WorkError::Permanent("nope".into()))
        }
    }

    fn checker() -> Arc<MarketTimingChecker> {
        Arc::new(MarketTimingChecker::new(Arc::new(FakeMarketHours::default())))
    }

    fn processor() -> Arc<WorkProcessor<FakeClock>> {
        Arc::new(WorkProcessor::new(
            Arc::new(WorkRegistry::new()),
            Arc::new(RunCache::new()),
            Arc::new(InMemoryJobHistoryStore::default()),
            checker(),
            Arc::new(EventBus::new()),
            FakeClock::new(),
            ProcessorConfig::default(),
        ))
    }

    #[tokio::test]
    async fn dependent_does_not_run_when_predecessor_fails() {
        let registry = Arc::new(WorkRegistry::new());
        registry.register(
            WorkType::builder(WorkId::new("a"), Arc::new(FailingHandler)).build(),
        );
        let b_calls = Arc::new(AtomicU32::new(0));
        registry.register(
            WorkType::builder(
                WorkId::new("b"),
                Arc::new(RecordingHandler {
                    subjects: vec![SubjectId::global()],
                    calls: Arc::clone(&b_calls),
                    fail_until: 0,
                }),
            )
            .depends_on([WorkId::new("a")])
            .build(),
        );

        let p = Arc::new(WorkProcessor::new(
            registry,
            Arc::new(RunCache::new()),
            Arc::new(InMemoryJobHistoryStore::default()),
            checker(),
            Arc::new(EventBus::new()),
            FakeClock::new(),
            ProcessorConfig { max_retries: 1, retry_backoff_base: std::time::Duration::from_millis(1) },
        ));
        p.tick().await;

        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_retries_then_succeeds() {
        let registry = Arc::new(WorkRegistry::new());
        let calls = Arc::new(AtomicU32::new(0));
        registry.register(
            WorkType::builder(
                WorkId::new("a"),
                Arc::new(RecordingHandler {
                    subjects: vec![SubjectId::global()],
                    calls: Arc::clone(&calls),
                    fail_until: 2,
                }),
            )
            .build(),
        );
        let job_history = Arc::new(InMemoryJobHistoryStore::default());

        let p = Arc::new(WorkProcessor::new(
            registry,
            Arc::new(RunCache::new()),
            Arc::clone(&job_history) as Arc<dyn JobHistoryStore>,
            checker(),
            Arc::new(EventBus::new()),
            FakeClock::new(),
            ProcessorConfig { max_retries: 3, retry_backoff_base: std::time::Duration::from_secs(1) },
        ));
        p.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let record = job_history.get("a").expect("recorded");
        assert_eq!(record.last_status, JobStatus::Success);
    }

    #[tokio::test]
    async fn trigger_called_repeatedly_while_ticking_causes_one_more_tick() {
        let p = processor();
        p.trigger();
        p.trigger();
        p.trigger();
        // Notify coalesces regardless of call count; nothing to assert
        // beyond "doesn't panic" since there's no registered work here —
        // the guarantee is exercised at the `tokio::sync::Notify` layer.
        assert_eq!(p.state(), ProcessorState::Idle);
    }

    #[tokio::test]
    async fn interval_gated_type_is_skipped_before_elapsed() {
        let registry = Arc::new(WorkRegistry::new());
        let calls = Arc::new(AtomicU32::new(0));
        registry.register(
            WorkType::builder(
                WorkId::new("a"),
                Arc::new(RecordingHandler {
                    subjects: vec![SubjectId::global()],
                    calls: Arc::clone(&calls),
                    fail_until: 0,
                }),
            )
            .interval(std::time::Duration::from_secs(60))
            .build(),
        );
        let job_history = Arc::new(InMemoryJobHistoryStore::default());
        job_history.record_execution("a", 0, JobStatus::Success).unwrap();

        let clock = FakeClock::new();
        clock.set_epoch_secs(10);
        let p = Arc::new(WorkProcessor::new(
            registry,
            Arc::new(RunCache::new()),
            job_history,
            checker(),
            Arc::new(EventBus::new()),
            clock,
            ProcessorConfig::default(),
        ));
        p.tick().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
