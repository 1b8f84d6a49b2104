//! Idle-work collaborator (spec §4.6), consumed by
//! `sentinel_engine::idle_processor`. The three fixed kinds the spec names
//! — technical refresh, sync, tag refresh — are fixed methods rather than
//! an open registry, since the Idle Processor's priority order is part of
//! its contract, not something pluggable.

use async_trait::async_trait;

use crate::error::AdapterError;

#[async_trait]
pub trait IdleWorkProvider: Send + Sync {
    async fn needs_technical_refresh(&self, isin: &str) -> Result<bool, AdapterError>;
    async fn refresh_technical(&self, isin: &str) -> Result<(), AdapterError>;

    async fn needs_sync(&self, isin: &str) -> Result<bool, AdapterError>;
    async fn sync_security(&self, isin: &str) -> Result<(), AdapterError>;

    async fn needs_tag_refresh(&self, isin: &str) -> Result<bool, AdapterError>;
    async fn refresh_tags(&self, isin: &str) -> Result<(), AdapterError>;
}
