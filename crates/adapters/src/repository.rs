//! Repository collaborators (spec §6): CRUD by stable natural key, plain
//! values in, plain values out. Concrete storage/schema is out of scope —
//! these traits are the only seam the work-orchestration core touches.

use async_trait::async_trait;

use crate::domain::{
    Allocation, CashBalance, CashFlow, ExchangeRate, PendingOrder, Position, Recommendation,
    Security,
};
use crate::error::AdapterError;

#[async_trait]
pub trait SecurityRepository: Send + Sync {
    async fn active_securities(&self) -> Result<Vec<Security>, AdapterError>;
}

#[async_trait]
pub trait PositionRepository: Send + Sync {
    async fn positions(&self) -> Result<Vec<Position>, AdapterError>;
}

#[async_trait]
pub trait CashRepository: Send + Sync {
    async fn cash_balances(&self) -> Result<Vec<CashBalance>, AdapterError>;
}

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// ISIN -> score, scaled to an integer so the state hash canonicalizes
    /// deterministically (no float formatting ambiguity).
    async fn scores(&self) -> Result<std::collections::BTreeMap<String, i64>, AdapterError>;
}

#[async_trait]
pub trait ExchangeRateRepository: Send + Sync {
    async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, AdapterError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn settings(&self) -> Result<std::collections::BTreeMap<String, String>, AdapterError>;
}

#[async_trait]
pub trait AllocationRepository: Send + Sync {
    async fn allocations(&self) -> Result<Vec<Allocation>, AdapterError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn pending_orders(&self) -> Result<Vec<PendingOrder>, AdapterError>;
}

#[async_trait]
pub trait CashFlowRepository: Send + Sync {
    async fn cash_flows_since(&self, since_epoch: u64) -> Result<Vec<CashFlow>, AdapterError>;
}

#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Idempotent: implementations upsert by a stable key (e.g. `(isin,
    /// generated_at)`) so replays from a restart don't duplicate rows.
    async fn store(&self, recommendations: Vec<Recommendation>) -> Result<(), AdapterError>;
}

/// Convenience bundle: everything the `StateHash` service and the planner
/// pipeline need to read. A single trait object keeps constructor
/// signatures in `sentinel-daemon` from ballooning into eight parameters.
#[async_trait]
pub trait PortfolioRepository:
    SecurityRepository
    + PositionRepository
    + CashRepository
    + ScoreRepository
    + ExchangeRateRepository
    + SettingsRepository
    + AllocationRepository
    + OrderRepository
    + Send
    + Sync
{
}

impl<T> PortfolioRepository for T where
    T: SecurityRepository
        + PositionRepository
        + CashRepository
        + ScoreRepository
        + ExchangeRateRepository
        + SettingsRepository
        + AllocationRepository
        + OrderRepository
        + Send
        + Sync
{
}
