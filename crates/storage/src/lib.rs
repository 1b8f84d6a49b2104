#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-storage: durable persistence for the two small tables the
//! work-orchestration core owns (spec §6) — `job_history` and `cache`.
//! Everything else (securities, positions, recommendations, ...) is
//! someone else's repository, reached through `sentinel-adapters` traits.

pub mod error;
pub mod expiring_cache_store;
pub mod job_history;
mod snapshot;

pub use error::StoreError;
pub use expiring_cache_store::{CacheRow, ExpiringCacheStore, FileExpiringCacheStore, InMemoryExpiringCacheStore};
pub use job_history::{FileJobHistoryStore, InMemoryJobHistoryStore, JobHistoryRecord, JobHistoryStore, JobStatus};
