//! Plain domain values returned by the repository/brokerage collaborators.
//!
//! These are intentionally thin — the scoring, optimizer, and dividend math
//! that produce/consume richer shapes are out of scope (spec §1 Non-goals);
//! the core only needs enough structure to canonicalize a state hash and to
//! pass artifacts between planner stages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub isin: String,
    pub symbol: String,
    pub exchange: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub isin: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalance {
    pub currency: String,
    pub amount_minor: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: i64,
    pub price_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub rate_e6: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub transaction_id: String,
    pub isin: String,
    pub amount_minor: i64,
    pub currency: String,
    pub booked_at_epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub isin: String,
    pub target_weight_bp: u32,
}

/// An order placed with the brokerage. Returned from `buy`/`sell`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub price_minor: i64,
}

/// A recommended trade produced by `planner:plan`, stored by `planner:store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub isin: String,
    pub side: OrderSide,
    pub quantity: i64,
    pub rationale: String,
}

/// Output of `planner:weights` (optimizer math is out of scope; this is
/// just the shape the pipeline passes downstream through the run cache).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerWeights {
    pub weight_bp_by_isin: std::collections::BTreeMap<String, u32>,
}

/// Output of `planner:context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityContext {
    pub candidate_isins: Vec<String>,
    pub notes: std::collections::BTreeMap<String, String>,
}

/// Output of `planner:plan`, consumed and persisted by `planner:store`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub trades: Vec<Recommendation>,
}

/// Output of the dividend-detection work type, scoped under the
/// `dividend:*` cache prefix invalidated by `DividendDetected` (spec §4.7).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedDividends {
    pub cash_flows: Vec<CashFlow>,
}

/// Full snapshot used to compute the portfolio-state hash (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub positions: Vec<Position>,
    pub active_securities: Vec<Security>,
    pub cash_balances: Vec<CashBalance>,
    pub pending_orders: Vec<PendingOrder>,
    pub scores: std::collections::BTreeMap<String, i64>,
    pub exchange_rates: Vec<ExchangeRate>,
    pub settings: std::collections::BTreeMap<String, String>,
    pub allocations: Vec<Allocation>,
}
