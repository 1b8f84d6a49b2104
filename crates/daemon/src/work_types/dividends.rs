//! Dividend detection work type (`dividend:detect`): scans cash flows for
//! entries not tied to a trade and emits `DividendDetected` per ISIN.
//! Dividend *accounting* (yield, tax treatment) is an out-of-scope domain
//! algorithm (spec §1 Non-goals); this work type only owns noticing that a
//! cash flow landed, which is what actually drives the `DividendDetected`
//! trigger `sentinel_engine::triggers` reacts to.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sentinel_adapters::CashFlowRepository;
use sentinel_core::{Event, SubjectId, WorkError};
use sentinel_engine::{EventBus, ProgressReporter, WorkContext, WorkHandler};

const KEY_LAST_SCANNED_AT: &str = "dividend:last_scanned_at";

pub struct DetectHandler {
    cash_flows: Arc<dyn CashFlowRepository>,
    bus: Arc<EventBus>,
}

impl DetectHandler {
    pub fn new(cash_flows: Arc<dyn CashFlowRepository>, bus: Arc<EventBus>) -> Self {
        Self { cash_flows, bus }
    }
}

#[async_trait]
impl WorkHandler for DetectHandler {
    async fn find_subjects(&self, _ctx: &WorkContext) -> Vec<SubjectId> {
        vec![SubjectId::global()]
    }

    async fn execute(
        &self,
        ctx: &WorkContext,
        _subject: &SubjectId,
        progress: &ProgressReporter,
        _cancel: &CancellationToken,
    ) -> Result<(), WorkError> {
        let since = ctx.cache.get::<u64>(KEY_LAST_SCANNED_AT).unwrap_or(0);
        let flows =
            self.cash_flows.cash_flows_since(since).await.map_err(|e| WorkError::Transient(e.to_string()))?;

        // Cash-flow-to-dividend classification is a domain heuristic out
        // of scope here; any positive, incoming flow is treated as a
        // dividend for the purpose of driving the trigger.
        for flow in flows.iter().filter(|f| f.amount_minor > 0) {
            progress.report(format!("dividend detected: {} {}", flow.isin, flow.amount_minor));
            self.bus.emit(Event::DividendDetected {
                module: "dividend_detector".to_string(),
                timestamp: ctx.now_epoch,
                isin: flow.isin.clone(),
                amount_minor: flow.amount_minor,
            });
        }

        ctx.cache.set(KEY_LAST_SCANNED_AT, ctx.now_epoch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::domain::CashFlow;
    use sentinel_adapters::error::AdapterError;
    use sentinel_core::WorkId;
    use sentinel_engine::RunCache;
    use tokio_util::sync::CancellationToken as Cancel;

    struct FixedCashFlows(Vec<CashFlow>);

    #[async_trait]
    impl CashFlowRepository for FixedCashFlows {
        async fn cash_flows_since(&self, _since_epoch: u64) -> Result<Vec<CashFlow>, AdapterError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn positive_flows_emit_dividend_detected_and_negative_ones_dont() {
        use sentinel_core::EventKind;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let flows = vec![
            CashFlow {
                transaction_id: "t1".into(),
                isin: "IT1".into(),
                amount_minor: 500,
                currency: "EUR".into(),
                booked_at_epoch: 10,
            },
            CashFlow {
                transaction_id: "t2".into(),
                isin: "IT2".into(),
                amount_minor: -500,
                currency: "EUR".into(),
                booked_at_epoch: 10,
            },
        ];
        let bus = Arc::new(EventBus::new());
        let detected = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&detected);
        bus.subscribe(
            EventKind::DividendDetected,
            Arc::new(move |_| {
                d.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let handler = DetectHandler::new(Arc::new(FixedCashFlows(flows)), Arc::clone(&bus));
        let cache = Arc::new(RunCache::new());
        let ctx = WorkContext { cache: Arc::clone(&cache), now_epoch: 42 };
        let progress = ProgressReporter::new(
            Arc::clone(&bus),
            "dividend_detector",
            WorkId::new("dividend:detect"),
            SubjectId::global(),
            42,
        );

        handler.execute(&ctx, &SubjectId::global(), &progress, &Cancel::new()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(detected.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get::<u64>("dividend:last_scanned_at"), Some(42));
    }
}
