//! The recommendation pipeline's four work types (spec §4.7):
//! `planner:weights -> planner:context -> planner:plan -> planner:store`,
//! chained through the run cache rather than through return values, so the
//! processor's dependency-ordering (not a hand-rolled call chain) is what
//! actually sequences them.
//!
//! Each stage's `find_subjects` checks whether its own cache key is
//! already populated and returns nothing if so — the idempotence
//! mechanism spec §5 calls "checking existence of their output before
//! producing it." `StateChanged` is what makes them runnable again, by
//! deleting the whole `planner:` prefix (`sentinel_engine::triggers`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sentinel_adapters::domain::{OpportunityContext, OptimizerWeights, TradePlan};
use sentinel_adapters::{PlannerDomain, PortfolioRepository, RecommendationRepository};
use sentinel_core::{Event, SubjectId, WorkError};
use sentinel_engine::{EventBus, ProgressReporter, WorkContext, WorkHandler};

const KEY_WEIGHTS: &str = "planner:weights";
const KEY_CONTEXT: &str = "planner:context";
const KEY_PLAN: &str = "planner:plan";
const KEY_STORE_MARKER: &str = "planner:store_marker";

pub struct WeightsHandler {
    repo: Arc<dyn PortfolioRepository>,
    domain: Arc<dyn PlannerDomain>,
}

impl WeightsHandler {
    pub fn new(repo: Arc<dyn PortfolioRepository>, domain: Arc<dyn PlannerDomain>) -> Self {
        Self { repo, domain }
    }
}

#[async_trait]
impl WorkHandler for WeightsHandler {
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId> {
        if ctx.cache.has(KEY_WEIGHTS) {
            return Vec::new();
        }
        vec![SubjectId::global()]
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        _subject: &SubjectId,
        _progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        let positions = self.repo.positions().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let active_securities =
            self.repo.active_securities().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let cash_balances = self.repo.cash_balances().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let pending_orders = self.repo.pending_orders().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let scores = self.repo.scores().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let exchange_rates = self.repo.exchange_rates().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let settings = self.repo.settings().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let allocations = self.repo.allocations().await.map_err(|e| WorkError::Transient(e.to_string()))?;

        let state = sentinel_adapters::domain::PortfolioState {
            positions,
            active_securities,
            cash_balances,
            pending_orders,
            scores,
            exchange_rates,
            settings,
            allocations,
        };

        let weights = self.domain.compute_weights(&state).await.map_err(|e| WorkError::Permanent(e.to_string()))?;
        ctx.cache.set(KEY_WEIGHTS, weights);
        Ok(())
    }
}

pub struct ContextHandler {
    repo: Arc<dyn PortfolioRepository>,
    domain: Arc<dyn PlannerDomain>,
}

impl ContextHandler {
    pub fn new(repo: Arc<dyn PortfolioRepository>, domain: Arc<dyn PlannerDomain>) -> Self {
        Self { repo, domain }
    }
}

#[async_trait]
impl WorkHandler for ContextHandler {
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId> {
        if ctx.cache.has(KEY_CONTEXT) {
            return Vec::new();
        }
        vec![SubjectId::global()]
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        _subject: &SubjectId,
        _progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        let weights: OptimizerWeights = ctx
            .cache
            .get(KEY_WEIGHTS)
            .ok_or_else(|| WorkError::Permanent("planner:weights output missing from cache".to_string()))?;

        let active_securities =
            self.repo.active_securities().await.map_err(|e| WorkError::Transient(e.to_string()))?;
        let state =
            sentinel_adapters::domain::PortfolioState { active_securities, ..Default::default() };

        let context =
            self.domain.build_context(&weights, &state).await.map_err(|e| WorkError::Permanent(e.to_string()))?;
        ctx.cache.set(KEY_CONTEXT, context);
        Ok(())
    }
}

pub struct PlanHandler {
    domain: Arc<dyn PlannerDomain>,
    bus: Arc<EventBus>,
}

impl PlanHandler {
    pub fn new(domain: Arc<dyn PlannerDomain>, bus: Arc<EventBus>) -> Self {
        Self { domain, bus }
    }
}

#[async_trait]
impl WorkHandler for PlanHandler {
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId> {
        if ctx.cache.has(KEY_PLAN) {
            return Vec::new();
        }
        vec![SubjectId::global()]
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        _subject: &SubjectId,
        _progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        let context: OpportunityContext = ctx
            .cache
            .get(KEY_CONTEXT)
            .ok_or_else(|| WorkError::Permanent("planner:context output missing from cache".to_string()))?;

        let plan = self.domain.build_plan(&context).await.map_err(|e| WorkError::Permanent(e.to_string()))?;
        self.bus.emit(Event::PlanGenerated {
            module: "planner".to_string(),
            timestamp: ctx.now_epoch,
            trade_count: plan.trades.len(),
        });
        ctx.cache.set(KEY_PLAN, plan);
        Ok(())
    }
}

pub struct StoreHandler {
    recommendations: Arc<dyn RecommendationRepository>,
    bus: Arc<EventBus>,
}

impl StoreHandler {
    pub fn new(recommendations: Arc<dyn RecommendationRepository>, bus: Arc<EventBus>) -> Self {
        Self { recommendations, bus }
    }
}

#[async_trait]
impl WorkHandler for StoreHandler {
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId> {
        if !ctx.cache.has(KEY_PLAN) || ctx.cache.has(KEY_STORE_MARKER) {
            return Vec::new();
        }
        vec![SubjectId::global()]
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        _subject: &SubjectId,
        progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        let plan: TradePlan = ctx
            .cache
            .get(KEY_PLAN)
            .ok_or_else(|| WorkError::Permanent("planner:plan output missing from cache".to_string()))?;

        progress.report(format!("storing {} recommendations", plan.trades.len()));
        self.recommendations
            .store(plan.trades.clone())
            .await
            .map_err(|e| WorkError::Transient(e.to_string()))?;

        ctx.cache.set(KEY_STORE_MARKER, true);
        self.bus.emit(Event::RecommendationsReady {
            module: "planner".to_string(),
            timestamp: ctx.now_epoch,
            count: plan.trades.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::fakes::{
        FakePlannerDomain, FakePortfolioRepository, FakeRecommendationRepository,
    };
    use sentinel_adapters::domain::{PortfolioState, Security};
    use sentinel_core::WorkId;
    use sentinel_engine::RunCache;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken as Cancel;

    fn ctx(cache: Arc<RunCache>) -> WorkContext {
        WorkContext { cache, now_epoch: 1_000 }
    }

    fn progress(bus: Arc<EventBus>) -> ProgressReporter {
        ProgressReporter::new(bus, "planner", WorkId::new("planner:store"), SubjectId::global(), 1_000)
    }

    #[tokio::test]
    async fn full_pipeline_populates_cache_and_stores_recommendations() {
        let repo = Arc::new(FakePortfolioRepository::new(PortfolioState {
            active_securities: vec![Security {
                isin: "IT0000000001".to_string(),
                symbol: "ENI".to_string(),
                exchange: "XMIL".to_string(),
                active: true,
            }],
            ..Default::default()
        }));
        let domain = Arc::new(FakePlannerDomain);
        let recommendations = Arc::new(FakeRecommendationRepository::default());
        let bus = Arc::new(EventBus::new());
        let cache = Arc::new(RunCache::new());

        let weights = WeightsHandler::new(repo.clone(), domain.clone());
        let context = ContextHandler::new(repo.clone(), domain.clone());
        let plan = PlanHandler::new(domain.clone(), Arc::clone(&bus));
        let store = StoreHandler::new(recommendations.clone(), Arc::clone(&bus));
        let cancel = Cancel::new();

        let c = ctx(Arc::clone(&cache));
        assert_eq!(weights.find_subjects(&c).await, vec![SubjectId::global()]);
        weights.execute(&c, &SubjectId::global(), &progress(Arc::clone(&bus)), &cancel).await.unwrap();
        assert!(weights.find_subjects(&c).await.is_empty());

        context.execute(&c, &SubjectId::global(), &progress(Arc::clone(&bus)), &cancel).await.unwrap();
        plan.execute(&c, &SubjectId::global(), &progress(Arc::clone(&bus)), &cancel).await.unwrap();
        store.execute(&c, &SubjectId::global(), &progress(Arc::clone(&bus)), &cancel).await.unwrap();

        assert_eq!(recommendations.stored().len(), 1);
        // Re-running `find_subjects` after store is a no-op: both the plan
        // and the store marker are already populated.
        assert!(store.find_subjects(&c).await.is_empty());

        // Simulate `StateChanged`'s `DeletePrefix("planner:")`.
        cache.delete_prefix("planner:");
        assert_eq!(weights.find_subjects(&c).await, vec![SubjectId::global()]);
        assert!(store.find_subjects(&c).await.is_empty());

        let _ = Duration::from_millis(0);
    }

    #[tokio::test]
    async fn context_fails_permanently_without_upstream_weights() {
        let repo = Arc::new(FakePortfolioRepository::default());
        let domain = Arc::new(FakePlannerDomain);
        let bus = Arc::new(EventBus::new());
        let cache = Arc::new(RunCache::new());
        let context = ContextHandler::new(repo, domain);
        let cancel = Cancel::new();

        let result = context
            .execute(&ctx(cache), &SubjectId::global(), &progress(bus), &cancel)
            .await;
        assert!(matches!(result, Err(WorkError::Permanent(_))));
    }
}
