//! In-memory fakes for the collaborator traits, gated behind `test-support`
//! (mirrors the teacher's own `test-support` feature on `oj-adapters`).
//! Used as dev-dependencies by `sentinel-engine`'s test suite, and also
//! pulled in as a normal (non-dev) dependency by `sentinel-daemon`: concrete
//! brokerage/database adapters are out of scope, so `sentineld` links these
//! fakes directly to serve as its runnable demonstration runtime (see
//! `crates/daemon/src/runtime.rs`).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use std::collections::BTreeSet;

use crate::brokerage::BrokerageClient;
use crate::domain::{
    Allocation, CashBalance, CashFlow, ExchangeRate, OpportunityContext, OptimizerWeights,
    OrderResult, PendingOrder, PortfolioState, Position, Quote, Recommendation, Security,
    TradePlan,
};
use crate::error::AdapterError;
use crate::idle_work::IdleWorkProvider;
use crate::market_hours::MarketHoursService;
use crate::planner::PlannerDomain;
use crate::repository::{
    AllocationRepository, CashFlowRepository, CashRepository, ExchangeRateRepository,
    OrderRepository, PositionRepository, RecommendationRepository, ScoreRepository,
    SecurityRepository, SettingsRepository,
};

/// Fake portfolio repository backed by a single mutable `PortfolioState`,
/// swappable mid-test to simulate a state change between ticks.
#[derive(Clone, Default)]
pub struct FakePortfolioRepository {
    state: Arc<Mutex<PortfolioState>>,
}

impl FakePortfolioRepository {
    pub fn new(state: PortfolioState) -> Self {
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn set_state(&self, state: PortfolioState) {
        *self.state.lock() = state;
    }

    pub fn snapshot(&self) -> PortfolioState {
        self.state.lock().clone()
    }
}

#[async_trait]
impl SecurityRepository for FakePortfolioRepository {
    async fn active_securities(&self) -> Result<Vec<Security>, AdapterError> {
        Ok(self.state.lock().active_securities.clone())
    }
}

#[async_trait]
impl PositionRepository for FakePortfolioRepository {
    async fn positions(&self) -> Result<Vec<Position>, AdapterError> {
        Ok(self.state.lock().positions.clone())
    }
}

#[async_trait]
impl CashRepository for FakePortfolioRepository {
    async fn cash_balances(&self) -> Result<Vec<CashBalance>, AdapterError> {
        Ok(self.state.lock().cash_balances.clone())
    }
}

#[async_trait]
impl ScoreRepository for FakePortfolioRepository {
    async fn scores(&self) -> Result<BTreeMap<String, i64>, AdapterError> {
        Ok(self.state.lock().scores.clone())
    }
}

#[async_trait]
impl ExchangeRateRepository for FakePortfolioRepository {
    async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, AdapterError> {
        Ok(self.state.lock().exchange_rates.clone())
    }
}

#[async_trait]
impl SettingsRepository for FakePortfolioRepository {
    async fn settings(&self) -> Result<BTreeMap<String, String>, AdapterError> {
        Ok(self.state.lock().settings.clone())
    }
}

#[async_trait]
impl AllocationRepository for FakePortfolioRepository {
    async fn allocations(&self) -> Result<Vec<Allocation>, AdapterError> {
        Ok(self.state.lock().allocations.clone())
    }
}

#[async_trait]
impl OrderRepository for FakePortfolioRepository {
    async fn pending_orders(&self) -> Result<Vec<PendingOrder>, AdapterError> {
        Ok(self.state.lock().pending_orders.clone())
    }
}

#[async_trait]
impl CashFlowRepository for FakePortfolioRepository {
    async fn cash_flows_since(&self, _since_epoch: u64) -> Result<Vec<CashFlow>, AdapterError> {
        Ok(Vec::new())
    }
}

/// Records every call so tests can assert on what was stored (spec §8
/// scenario 2-style "expect stored recommendations" assertions).
#[derive(Clone, Default)]
pub struct FakeRecommendationRepository {
    stored: Arc<Mutex<Vec<Recommendation>>>,
}

impl FakeRecommendationRepository {
    pub fn stored(&self) -> Vec<Recommendation> {
        self.stored.lock().clone()
    }
}

#[async_trait]
impl RecommendationRepository for FakeRecommendationRepository {
    async fn store(&self, recommendations: Vec<Recommendation>) -> Result<(), AdapterError> {
        self.stored.lock().extend(recommendations);
        Ok(())
    }
}

/// Fake brokerage client with a controllable connection flag and canned
/// order results; never calls out to a real network.
#[derive(Clone)]
pub struct FakeBrokerageClient {
    connected: Arc<Mutex<bool>>,
    positions: Arc<Mutex<Vec<Position>>>,
    next_order_id: Arc<Mutex<u64>>,
}

impl Default for FakeBrokerageClient {
    fn default() -> Self {
        Self {
            connected: Arc::new(Mutex::new(true)),
            positions: Arc::new(Mutex::new(Vec::new())),
            next_order_id: Arc::new(Mutex::new(1)),
        }
    }
}

impl FakeBrokerageClient {
    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock() = connected;
    }

    pub fn set_positions(&self, positions: Vec<Position>) {
        *self.positions.lock() = positions;
    }
}

#[async_trait]
impl BrokerageClient for FakeBrokerageClient {
    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn positions(&self) -> Result<Vec<Position>, AdapterError> {
        if !self.is_connected() {
            return Err(AdapterError::NotConnected);
        }
        Ok(self.positions.lock().clone())
    }

    async fn cash_balances(&self) -> Result<Vec<CashBalance>, AdapterError> {
        Ok(Vec::new())
    }

    async fn pending_orders(&self) -> Result<Vec<PendingOrder>, AdapterError> {
        Ok(Vec::new())
    }

    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AdapterError> {
        Ok(symbols.iter().map(|s| Quote { symbol: s.clone(), price_minor: 10_000 }).collect())
    }

    async fn cash_flows(&self, _since_epoch: u64) -> Result<Vec<CashFlow>, AdapterError> {
        Ok(Vec::new())
    }

    async fn buy(
        &self,
        _symbol: &str,
        _quantity: i64,
        limit_price_minor: Option<i64>,
    ) -> Result<OrderResult, AdapterError> {
        let mut id = self.next_order_id.lock();
        let order_id = format!("FAKE-{}", *id);
        *id += 1;
        Ok(OrderResult { order_id, price_minor: limit_price_minor.unwrap_or(10_000) })
    }

    async fn sell(
        &self,
        symbol: &str,
        quantity: i64,
        limit_price_minor: Option<i64>,
    ) -> Result<OrderResult, AdapterError> {
        self.buy(symbol, quantity, limit_price_minor).await
    }
}

/// Fake market hours with per-exchange open/closed flags set by the test.
#[derive(Clone, Default)]
pub struct FakeMarketHours {
    open: Arc<Mutex<BTreeMap<String, bool>>>,
    exchange_by_isin: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FakeMarketHours {
    pub fn set_open(&self, exchange: impl Into<String>, open: bool) {
        self.open.lock().insert(exchange.into(), open);
    }

    pub fn map_security(&self, isin: impl Into<String>, exchange: impl Into<String>) {
        self.exchange_by_isin.lock().insert(isin.into(), exchange.into());
    }
}

#[async_trait]
impl MarketHoursService for FakeMarketHours {
    async fn is_market_open(&self, exchange: &str, _at_epoch_secs: u64) -> Result<bool, AdapterError> {
        Ok(*self.open.lock().get(exchange).unwrap_or(&false))
    }

    async fn open_markets(&self, _at_epoch_secs: u64) -> Result<Vec<String>, AdapterError> {
        Ok(self.open.lock().iter().filter(|(_, &open)| open).map(|(k, _)| k.clone()).collect())
    }

    async fn exchange_for_security(&self, isin: &str) -> Result<String, AdapterError> {
        self.exchange_by_isin
            .lock()
            .get(isin)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownSecurity(isin.to_string()))
    }
}

/// Fake planner domain: deterministic, trivial transforms so pipeline tests
/// can assert on cache contents without real optimizer/scoring math.
#[derive(Clone, Default)]
pub struct FakePlannerDomain;

#[async_trait]
impl PlannerDomain for FakePlannerDomain {
    async fn compute_weights(&self, state: &PortfolioState) -> Result<OptimizerWeights, AdapterError> {
        let mut weight_bp_by_isin = BTreeMap::new();
        for sec in &state.active_securities {
            weight_bp_by_isin.insert(sec.isin.clone(), 100);
        }
        Ok(OptimizerWeights { weight_bp_by_isin })
    }

    async fn build_context(
        &self,
        weights: &OptimizerWeights,
        _state: &PortfolioState,
    ) -> Result<OpportunityContext, AdapterError> {
        Ok(OpportunityContext {
            candidate_isins: weights.weight_bp_by_isin.keys().cloned().collect(),
            notes: BTreeMap::new(),
        })
    }

    async fn build_plan(&self, context: &OpportunityContext) -> Result<TradePlan, AdapterError> {
        use crate::domain::OrderSide;
        Ok(TradePlan {
            trades: context
                .candidate_isins
                .iter()
                .map(|isin| Recommendation {
                    isin: isin.clone(),
                    side: OrderSide::Buy,
                    quantity: 1,
                    rationale: "fake planner".to_string(),
                })
                .collect(),
        })
    }
}

/// Fake idle-work provider: tests flag which (kind, isin) pairs "need"
/// work, and record which ones were actually refreshed.
#[derive(Clone, Default)]
pub struct FakeIdleWorkProvider {
    needs_technical: Arc<Mutex<BTreeSet<String>>>,
    needs_sync: Arc<Mutex<BTreeSet<String>>>,
    needs_tags: Arc<Mutex<BTreeSet<String>>>,
    refreshed: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl FakeIdleWorkProvider {
    pub fn mark_needs_technical(&self, isin: impl Into<String>) {
        self.needs_technical.lock().insert(isin.into());
    }

    pub fn mark_needs_sync(&self, isin: impl Into<String>) {
        self.needs_sync.lock().insert(isin.into());
    }

    pub fn mark_needs_tags(&self, isin: impl Into<String>) {
        self.needs_tags.lock().insert(isin.into());
    }

    pub fn refreshed(&self) -> Vec<(&'static str, String)> {
        self.refreshed.lock().clone()
    }
}

#[async_trait]
impl IdleWorkProvider for FakeIdleWorkProvider {
    async fn needs_technical_refresh(&self, isin: &str) -> Result<bool, AdapterError> {
        Ok(self.needs_technical.lock().contains(isin))
    }

    async fn refresh_technical(&self, isin: &str) -> Result<(), AdapterError> {
        self.needs_technical.lock().remove(isin);
        self.refreshed.lock().push(("technical", isin.to_string()));
        Ok(())
    }

    async fn needs_sync(&self, isin: &str) -> Result<bool, AdapterError> {
        Ok(self.needs_sync.lock().contains(isin))
    }

    async fn sync_security(&self, isin: &str) -> Result<(), AdapterError> {
        self.needs_sync.lock().remove(isin);
        self.refreshed.lock().push(("sync", isin.to_string()));
        Ok(())
    }

    async fn needs_tag_refresh(&self, isin: &str) -> Result<bool, AdapterError> {
        Ok(self.needs_tags.lock().contains(isin))
    }

    async fn refresh_tags(&self, isin: &str) -> Result<(), AdapterError> {
        self.needs_tags.lock().remove(isin);
        self.refreshed.lock().push(("tags", isin.to_string()));
        Ok(())
    }
}
