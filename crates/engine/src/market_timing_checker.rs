//! Market-Timing Checker (spec §4.4): the policy table deciding whether a
//! work unit may run given current market open/closed status.

use std::sync::Arc;

use sentinel_core::{MarketTiming, SubjectId};
use sentinel_adapters::MarketHoursService;

pub struct MarketTimingChecker {
    market_hours: Arc<dyn MarketHoursService>,
}

impl MarketTimingChecker {
    pub fn new(market_hours: Arc<dyn MarketHoursService>) -> Self {
        Self { market_hours }
    }

    /// `CanExecute(timing, subject)`. Fails closed: any collaborator error,
    /// or an exchange the market-hours service doesn't recognize, denies
    /// execution rather than risking an out-of-hours trade.
    pub async fn can_execute(&self, timing: MarketTiming, subject: &SubjectId, now_epoch: u64) -> bool {
        match timing {
            MarketTiming::AnyTime => true,
            MarketTiming::DuringMarketOpen => {
                if subject.is_global() {
                    self.any_market_open(now_epoch).await
                } else {
                    self.security_open(subject, now_epoch).await
                }
            }
            MarketTiming::AfterMarketClose => {
                if subject.is_global() {
                    !self.any_market_open(now_epoch).await
                } else {
                    !self.security_open(subject, now_epoch).await
                }
            }
            MarketTiming::AllMarketsClosed => !self.any_market_open(now_epoch).await,
        }
    }

    async fn any_market_open(&self, now_epoch: u64) -> bool {
        match self.market_hours.open_markets(now_epoch).await {
            Ok(open) => !open.is_empty(),
            Err(e) => {
                tracing::warn!(error = %e, "open_markets lookup failed, failing closed");
                false
            }
        }
    }

    async fn security_open(&self, subject: &SubjectId, now_epoch: u64) -> bool {
        let exchange = match self.market_hours.exchange_for_security(subject.as_str()).await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "exchange lookup failed, failing closed");
                return false;
            }
        };
        match self.market_hours.is_market_open(&exchange, now_epoch).await {
            Ok(open) => open,
            Err(e) => {
                tracing::warn!(%exchange, error = %e, "is_market_open lookup failed, failing closed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_adapters::fakes::FakeMarketHours;

    fn checker(fake: &FakeMarketHours) -> MarketTimingChecker {
        MarketTimingChecker::new(Arc::new(fake.clone()))
    }

    #[tokio::test]
    async fn any_time_always_allows() {
        let fake = FakeMarketHours::default();
        let checker = checker(&fake);
        assert!(checker.can_execute(MarketTiming::AnyTime, &SubjectId::global(), 0).await);
        assert!(checker.can_execute(MarketTiming::AnyTime, &SubjectId::new("IT1"), 0).await);
    }

    #[tokio::test]
    async fn during_market_open_global_checks_any_market() {
        let fake = FakeMarketHours::default();
        let checker = checker(&fake);
        assert!(!checker.can_execute(MarketTiming::DuringMarketOpen, &SubjectId::global(), 0).await);
        fake.set_open("XMIL", true);
        assert!(checker.can_execute(MarketTiming::DuringMarketOpen, &SubjectId::global(), 0).await);
    }

    #[tokio::test]
    async fn during_market_open_subject_checks_its_exchange() {
        let fake = FakeMarketHours::default();
        fake.map_security("IT0000000001", "XMIL");
        let checker = checker(&fake);

        assert!(!checker.can_execute(MarketTiming::DuringMarketOpen, &SubjectId::new("IT0000000001"), 0).await);

        fake.set_open("XMIL", true);
        assert!(checker.can_execute(MarketTiming::DuringMarketOpen, &SubjectId::new("IT0000000001"), 0).await);
    }

    #[tokio::test]
    async fn all_markets_closed_ignores_subject() {
        let fake = FakeMarketHours::default();
        fake.set_open("XNYS", true);
        let checker = checker(&fake);
        assert!(!checker.can_execute(MarketTiming::AllMarketsClosed, &SubjectId::new("US1"), 0).await);
    }

    #[tokio::test]
    async fn unknown_security_fails_closed() {
        let fake = FakeMarketHours::default();
        let checker = checker(&fake);
        assert!(!checker.can_execute(MarketTiming::DuringMarketOpen, &SubjectId::new("NOPE"), 0).await);
    }

    #[tokio::test]
    async fn after_market_close_is_the_inverse_of_during_open() {
        let fake = FakeMarketHours::default();
        let checker = checker(&fake);
        assert!(checker.can_execute(MarketTiming::AfterMarketClose, &SubjectId::global(), 0).await);
        fake.set_open("XMIL", true);
        assert!(!checker.can_execute(MarketTiming::AfterMarketClose, &SubjectId::global(), 0).await);
    }
}
