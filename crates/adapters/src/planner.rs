//! The planner's domain-algorithm collaborator (spec §1 Non-goals:
//! "domain algorithms (scoring, optimizer math, Kelly/CVaR, dividend yield
//! computation)" are explicitly external). The recommendation pipeline's
//! four work types (`planner:weights/context/plan/store`) call through this
//! trait rather than embedding any scoring/optimization logic themselves.

use async_trait::async_trait;

use crate::domain::{OpportunityContext, OptimizerWeights, PortfolioState, TradePlan};
use crate::error::AdapterError;

#[async_trait]
pub trait PlannerDomain: Send + Sync {
    async fn compute_weights(&self, state: &PortfolioState) -> Result<OptimizerWeights, AdapterError>;

    async fn build_context(
        &self,
        weights: &OptimizerWeights,
        state: &PortfolioState,
    ) -> Result<OpportunityContext, AdapterError>;

    async fn build_plan(&self, context: &OpportunityContext) -> Result<TradePlan, AdapterError>;
}
