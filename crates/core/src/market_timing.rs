//! The `market_timing` field on a `WorkType` descriptor (spec §4.4).
//!
//! The policy table itself (`CanExecute`) lives in
//! `sentinel_engine::market_timing_checker` because evaluating it requires
//! the `MarketHoursService` collaborator; this enum is just the closed set
//! of constraint kinds the registry stores per work type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketTiming {
    AnyTime,
    DuringMarketOpen,
    AfterMarketClose,
    AllMarketsClosed,
}

impl std::fmt::Display for MarketTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketTiming::AnyTime => "any_time",
            MarketTiming::DuringMarketOpen => "during_market_open",
            MarketTiming::AfterMarketClose => "after_market_close",
            MarketTiming::AllMarketsClosed => "all_markets_closed",
        };
        write!(f, "{s}")
    }
}
