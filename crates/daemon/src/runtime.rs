//! Wires the work-orchestration core's components into one runnable unit.
//! Collaborators are built once by the caller (here, `main.rs`) and handed
//! in, never reached for through a global.

use std::path::PathBuf;
use std::sync::Arc;

use sentinel_adapters::fakes::{
    FakeBrokerageClient, FakeMarketHours, FakePlannerDomain, FakePortfolioRepository,
    FakeRecommendationRepository,
};
use sentinel_core::{IdleProcessorConfig, ProcessorConfig, SchedulerConfig, StateMonitorConfig, SystemClock};
use sentinel_engine::{EventBus, IdleProcessor, MarketTimingChecker, RunCache, Scheduler, StateMonitor, WorkProcessor, WorkRegistry};
use sentinel_storage::{FileJobHistoryStore, JobHistoryStore};

use crate::work_types;

/// Construction-time knobs, gathered from the environment by `main.rs`
/// (spec §9: "config comes from construction, never a global").
pub struct RuntimeConfig {
    pub state_dir: PathBuf,
    pub processor: ProcessorConfig,
    pub idle: IdleProcessorConfig,
    pub state_monitor: StateMonitorConfig,
    pub scheduler: SchedulerConfig,
}

/// Owns every long-running task the work-orchestration core spawns. Built
/// once at process start; `run()` blocks until shutdown is requested.
pub struct Runtime {
    bus: Arc<EventBus>,
    processor: Arc<WorkProcessor<SystemClock>>,
    idle: Arc<IdleProcessor<SystemClock>>,
    state_monitor: Arc<StateMonitor<SystemClock>>,
    scheduler: Arc<Scheduler>,
    // Kept alive for the demonstration runtime's lifetime; a real
    // deployment would swap these for concrete adapters (spec §1
    // Non-goals) without touching anything above this line.
    _recommendations: Arc<FakeRecommendationRepository>,
    _brokerage: Arc<FakeBrokerageClient>,
    _market_hours: Arc<FakeMarketHours>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        let cache = Arc::new(RunCache::new());

        let job_history_path = config.state_dir.join("job_history.bin");
        let job_history: Arc<dyn JobHistoryStore> = match FileJobHistoryStore::open(&job_history_path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(error = %e, path = %job_history_path.display(), "falling back to in-memory job history");
                Arc::new(sentinel_storage::InMemoryJobHistoryStore::default())
            }
        };

        // Concrete brokerage/database/market-hours adapters are out of
        // scope (spec §1); this demonstration runtime wires the
        // `test-support` fakes so the wiring below is exercised end to
        // end. A production deployment swaps these four `Fake*`
        // constructions for real adapters without touching anything else
        // in this function.
        let portfolio = Arc::new(FakePortfolioRepository::default());
        let market_hours = Arc::new(FakeMarketHours::default());
        let brokerage = Arc::new(FakeBrokerageClient::default());
        let recommendations = Arc::new(FakeRecommendationRepository::default());
        let planner_domain = Arc::new(FakePlannerDomain);

        let market_timing = Arc::new(MarketTimingChecker::new(Arc::clone(&market_hours) as Arc<dyn sentinel_adapters::MarketHoursService>));

        let registry = Arc::new(WorkRegistry::new());
        work_types::register_all(
            &registry,
            Arc::clone(&portfolio) as Arc<dyn sentinel_adapters::PortfolioRepository>,
            planner_domain as Arc<dyn sentinel_adapters::PlannerDomain>,
            Arc::clone(&recommendations) as Arc<dyn sentinel_adapters::RecommendationRepository>,
            Arc::clone(&portfolio) as Arc<dyn sentinel_adapters::CashFlowRepository>,
            Arc::clone(&brokerage) as Arc<dyn sentinel_adapters::BrokerageClient>,
            Arc::clone(&bus),
        );

        let processor = Arc::new(WorkProcessor::new(
            registry,
            Arc::clone(&cache),
            Arc::clone(&job_history),
            market_timing,
            Arc::clone(&bus),
            SystemClock,
            config.processor,
        ));

        sentinel_engine::triggers::install(
            &bus,
            Arc::clone(&cache),
            Arc::clone(&processor) as Arc<dyn sentinel_engine::Triggerable>,
        );

        let idle = Arc::new(IdleProcessor::new(
            Arc::clone(&processor) as Arc<dyn sentinel_engine::QueueSizeSource>,
            Arc::clone(&portfolio) as Arc<dyn sentinel_adapters::SecurityRepository>,
            Arc::new(DefaultIdleWorkProvider) as Arc<dyn sentinel_adapters::IdleWorkProvider>,
            Arc::clone(&bus),
            SystemClock,
            config.idle,
        ));

        let state_monitor = Arc::new(StateMonitor::new(
            portfolio as Arc<dyn sentinel_adapters::PortfolioRepository>,
            Arc::clone(&bus),
            SystemClock,
            config.state_monitor,
        ));

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&processor) as Arc<dyn sentinel_engine::Triggerable>,
            config.scheduler,
        ));

        Self {
            bus,
            processor,
            idle,
            state_monitor,
            scheduler,
            _recommendations: recommendations,
            _brokerage: brokerage,
            _market_hours: market_hours,
        }
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn processor(&self) -> Arc<WorkProcessor<SystemClock>> {
        Arc::clone(&self.processor)
    }

    /// Starts every background task. Each component owns its own spawn
    /// (spec §5: "no single event loop; components expose task spawns").
    pub fn start(&self) {
        self.processor.start();
        self.idle.start();
        self.state_monitor.start();
        self.scheduler.start();
        // Everything is event-driven from `StateChanged` onward, but the
        // first tick has nothing to react to yet; kick one off so the
        // pipeline runs once at startup against the fakes' initial state.
        self.processor.trigger();
    }

    /// Cooperative shutdown: stops the scheduler and state monitor first
    /// (they only ever call `trigger()`), then the idle processor, then
    /// waits for the main processor's in-flight tick to finish.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
        self.state_monitor.stop().await;
        self.idle.stop().await;
        self.processor.stop().await;
    }
}

/// The main work-type set doesn't touch `IdleWorkProvider` itself — that's
/// the Idle Processor's own collaborator (spec §4.6). This demonstration
/// runtime reports nothing ever needs idle work so the background loop is
/// inert rather than silently depending on unimplemented refresh logic.
struct DefaultIdleWorkProvider;

#[async_trait::async_trait]
impl sentinel_adapters::IdleWorkProvider for DefaultIdleWorkProvider {
    async fn needs_technical_refresh(&self, _isin: &str) -> Result<bool, sentinel_adapters::AdapterError> {
        Ok(false)
    }
    async fn refresh_technical(&self, _isin: &str) -> Result<(), sentinel_adapters::AdapterError> {
        Ok(())
    }
    async fn needs_sync(&self, _isin: &str) -> Result<bool, sentinel_adapters::AdapterError> {
        Ok(false)
    }
    async fn sync_security(&self, _isin: &str) -> Result<(), sentinel_adapters::AdapterError> {
        Ok(())
    }
    async fn needs_tag_refresh(&self, _isin: &str) -> Result<bool, sentinel_adapters::AdapterError> {
        Ok(false)
    }
    async fn refresh_tags(&self, _isin: &str) -> Result<(), sentinel_adapters::AdapterError> {
        Ok(())
    }
}
