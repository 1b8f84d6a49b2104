//! Market hours collaborator (spec §6, consumed by
//! `sentinel_engine::market_timing_checker`).

use async_trait::async_trait;

use crate::error::AdapterError;

#[async_trait]
pub trait MarketHoursService: Send + Sync {
    /// True iff `exchange` is open at `at_epoch_secs`. Boundary ties
    /// (exactly at open/close) resolve as open, per spec §4.4.
    async fn is_market_open(&self, exchange: &str, at_epoch_secs: u64) -> Result<bool, AdapterError>;

    /// All exchanges currently open, at `at_epoch_secs`.
    async fn open_markets(&self, at_epoch_secs: u64) -> Result<Vec<String>, AdapterError>;

    /// The exchange a given security (subject) trades on. Used by
    /// `CanExecute` to resolve per-subject timing for non-global subjects.
    async fn exchange_for_security(&self, isin: &str) -> Result<String, AdapterError>;
}
