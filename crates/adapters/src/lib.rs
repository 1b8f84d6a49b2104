#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-adapters: collaborator traits the work-orchestration core
//! depends on through abstraction (spec §6) — repositories, the brokerage
//! client, and the market-hours service — plus plain domain value types.
//!
//! No implementation lives here beyond the `test-support` fakes: concrete
//! database/brokerage/HTTP adapters are out of scope (spec §1).

pub mod brokerage;
pub mod domain;
pub mod error;
pub mod idle_work;
pub mod market_hours;
pub mod planner;
pub mod repository;

#[cfg(any(test, feature = "test-support"))]
pub mod fakes;

pub use brokerage::BrokerageClient;
pub use error::AdapterError;
pub use idle_work::IdleWorkProvider;
pub use market_hours::MarketHoursService;
pub use planner::PlannerDomain;
pub use repository::{
    AllocationRepository, CashFlowRepository, CashRepository, ExchangeRateRepository,
    OrderRepository, PortfolioRepository, PositionRepository, RecommendationRepository,
    ScoreRepository, SecurityRepository, SettingsRepository,
};
