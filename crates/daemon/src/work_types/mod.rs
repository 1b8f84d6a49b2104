//! The concrete work-type sets `sentineld` registers: the recommendation
//! pipeline (spec §4.7), dividend detection, and trade execution. This is
//! the one place in the workspace that wires `sentinel-adapters` traits
//! into `sentinel-engine::WorkHandler` implementations — everything
//! upstream of here is generic over the collaborator traits.

pub mod dividends;
pub mod planner;
pub mod trading;

use std::sync::Arc;
use std::time::Duration;

use sentinel_adapters::{BrokerageClient, CashFlowRepository, PlannerDomain, PortfolioRepository, RecommendationRepository};
use sentinel_core::{MarketTiming, WorkId};
use sentinel_engine::{EventBus, WorkRegistry, WorkType};

/// Registers the full work-type set in the dependency order spec §4.7
/// names. Registration order matters (FIFO is the processor's primary
/// ordering, spec §4.3) even though `depends_on` would reorder a
/// pathological registration anyway — registering in pipeline order keeps
/// the registry's `all()` output legible in logs and tests.
pub fn register_all(
    registry: &WorkRegistry,
    portfolio: Arc<dyn PortfolioRepository>,
    planner_domain: Arc<dyn PlannerDomain>,
    recommendations: Arc<dyn RecommendationRepository>,
    cash_flows: Arc<dyn CashFlowRepository>,
    brokerage: Arc<dyn BrokerageClient>,
    bus: Arc<EventBus>,
) {
    registry.register(
        WorkType::builder(
            WorkId::new("planner:weights"),
            Arc::new(planner::WeightsHandler::new(Arc::clone(&portfolio), Arc::clone(&planner_domain))),
        )
        .build(),
    );

    registry.register(
        WorkType::builder(
            WorkId::new("planner:context"),
            Arc::new(planner::ContextHandler::new(Arc::clone(&portfolio), Arc::clone(&planner_domain))),
        )
        .depends_on([WorkId::new("planner:weights")])
        .build(),
    );

    registry.register(
        WorkType::builder(
            WorkId::new("planner:plan"),
            Arc::new(planner::PlanHandler::new(Arc::clone(&planner_domain), Arc::clone(&bus))),
        )
        .depends_on([WorkId::new("planner:context")])
        .build(),
    );

    registry.register(
        WorkType::builder(
            WorkId::new("planner:store"),
            Arc::new(planner::StoreHandler::new(Arc::clone(&recommendations), Arc::clone(&bus))),
        )
        .depends_on([WorkId::new("planner:plan")])
        .build(),
    );

    registry.register(
        WorkType::builder(
            WorkId::new("trading:execute"),
            Arc::new(trading::ExecuteHandler::new(Arc::clone(&brokerage))),
        )
        .depends_on([WorkId::new("planner:store")])
        .market_timing(MarketTiming::DuringMarketOpen)
        .build(),
    );

    registry.register(
        WorkType::builder(
            WorkId::new("dividend:detect"),
            Arc::new(dividends::DetectHandler::new(Arc::clone(&cash_flows), bus)),
        )
        .market_timing(MarketTiming::AnyTime)
        .interval(Duration::from_secs(3600))
        .build(),
    );
}
