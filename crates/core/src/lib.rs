// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-core: shared types for the Sentinel work-orchestration core.
//!
//! This crate holds the vocabulary every other crate in the workspace
//! builds on: the closed `Event` enum, work-type identifiers, the
//! `Clock` abstraction, the error taxonomy, and the small policy enums
//! (`Priority`, `MarketTiming`) consulted by the registry and processor.
//! It has no knowledge of how work is discovered or executed — that
//! lives in `sentinel-engine`.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod hash;
pub mod ids;
pub mod market_timing;
pub mod priority;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{IdleProcessorConfig, ProcessorConfig, SchedulerConfig, StateMonitorConfig};
pub use error::WorkError;
pub use event::{Event, EventKind};
pub use hash::{canonical_hash, StateHash};
pub use ids::{SubjectId, Subscription, WorkId};
pub use market_timing::MarketTiming;
pub use priority::Priority;
