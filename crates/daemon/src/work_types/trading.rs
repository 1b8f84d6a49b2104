//! Trade execution work type (`trading:execute`): reads the stored
//! `trade_plan` artifact and places one order per not-yet-executed ISIN via
//! the `BrokerageClient` collaborator, gated to `DuringMarketOpen` so an
//! order is never placed against a closed exchange. Depends on
//! `planner:store` so it only runs once recommendations are durably
//! recorded (spec §4.7's pipeline table plus the `trading:execute` id
//! spec §3 names as an example `WorkType.id`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sentinel_adapters::domain::{OrderSide, TradePlan};
use sentinel_adapters::BrokerageClient;
use sentinel_core::{MarketTiming, SubjectId, WorkError};
use sentinel_engine::{ProgressReporter, WorkContext, WorkHandler};

const KEY_PLAN: &str = "planner:plan";
const KEY_EXECUTED_PREFIX: &str = "trading:executed:";

pub struct ExecuteHandler {
    brokerage: Arc<dyn BrokerageClient>,
}

impl ExecuteHandler {
    pub fn new(brokerage: Arc<dyn BrokerageClient>) -> Self {
        Self { brokerage }
    }

    pub const MARKET_TIMING: MarketTiming = MarketTiming::DuringMarketOpen;
}

#[async_trait]
impl WorkHandler for ExecuteHandler {
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId> {
        let Some(plan) = ctx.cache.get::<TradePlan>(KEY_PLAN) else {
            return Vec::new();
        };
        plan.trades
            .into_iter()
            .map(|t| t.isin)
            .filter(|isin| !ctx.cache.has(&format!("{KEY_EXECUTED_PREFIX}{isin}")))
            .map(SubjectId::new)
            .collect()
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        subject: &SubjectId,
        progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        if !self.brokerage.is_connected() {
            return Err(WorkError::Transient("brokerage not connected".to_string()));
        }

        let plan: TradePlan = ctx
            .cache
            .get(KEY_PLAN)
            .ok_or_else(|| WorkError::Permanent("trade_plan missing from cache".to_string()))?;
        let trade = plan
            .trades
            .iter()
            .find(|t| t.isin == subject.as_str())
            .ok_or_else(|| WorkError::Permanent(format!("no trade plan entry for {subject}")))?;

        progress.report(format!("placing order for {subject}"));
        let result = match trade.side {
            OrderSide::Buy => self.brokerage.buy(&trade.isin, trade.quantity, None).await,
            OrderSide::Sell => self.brokerage.sell(&trade.isin, trade.quantity, None).await,
        };
        let order = result.map_err(|e| WorkError::Transient(e.to_string()))?;
        tracing::info!(isin = %trade.isin, order_id = %order.order_id, price_minor = order.price_minor, "order placed");

        ctx.cache.set(format!("{KEY_EXECUTED_PREFIX}{}", subject.as_str()), order.order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::domain::Recommendation;
    use sentinel_adapters::fakes::FakeBrokerageClient;
    use sentinel_core::WorkId;
    use sentinel_engine::{EventBus, RunCache};
    use tokio_util::sync::CancellationToken as Cancel;

    fn plan_with(isin: &str) -> TradePlan {
        TradePlan {
            trades: vec![Recommendation {
                isin: isin.to_string(),
                side: OrderSide::Buy,
                quantity: 10,
                rationale: "test".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn finds_and_executes_unexecuted_isins() {
        let brokerage = Arc::new(FakeBrokerageClient::default());
        let handler = ExecuteHandler::new(brokerage);
        let cache = Arc::new(RunCache::new());
        cache.set(KEY_PLAN, plan_with("IT0000000001"));
        let ctx = WorkContext { cache: Arc::clone(&cache), now_epoch: 1 };

        let subjects = handler.find_subjects(&ctx).await;
        assert_eq!(subjects, vec![SubjectId::new("IT0000000001")]);

        let bus = Arc::new(EventBus::new());
        let progress =
            ProgressReporter::new(bus, "trading", WorkId::new("trading:execute"), subjects[0].clone(), 1);
        handler.execute(&ctx, &subjects[0], &progress, &Cancel::new()).await.unwrap();

        assert!(handler.find_subjects(&ctx).await.is_empty());
        assert!(cache.has("trading:executed:IT0000000001"));
    }

    #[tokio::test]
    async fn disconnected_brokerage_is_transient() {
        let brokerage = Arc::new(FakeBrokerageClient::default());
        brokerage.set_connected(false);
        let handler = ExecuteHandler::new(brokerage);
        let cache = Arc::new(RunCache::new());
        cache.set(KEY_PLAN, plan_with("IT1"));
        let ctx = WorkContext { cache, now_epoch: 1 };
        let bus = Arc::new(EventBus::new());
        let progress =
            ProgressReporter::new(bus, "trading", WorkId::new("trading:execute"), SubjectId::new("IT1"), 1);

        let result = handler.execute(&ctx, &SubjectId::new("IT1"), &progress, &Cancel::new()).await;
        assert!(matches!(result, Err(WorkError::Transient(_))));
    }
}
