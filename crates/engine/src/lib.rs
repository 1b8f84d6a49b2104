#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-engine: the work-orchestration core itself.
//!
//! Holds the Event Bus, the Run Cache (+ expiring variant), the Work
//! Registry, the Market-Timing Checker, the Work Processor, the Idle
//! Processor, the State-Hash Monitor, and the Time Scheduler — the
//! subsystem `spec.md` §1 calls "the HARD engineering." Everything here is
//! generic over the collaborator traits in `sentinel-adapters`; concrete
//! repositories/brokerage/market-hours implementations are wired in by
//! `sentinel-daemon`.

pub mod bus;
pub mod cache;
pub mod error;
pub mod expiring_cache;
pub mod idle_processor;
pub mod market_timing_checker;
pub mod processor;
pub mod progress;
pub mod registry;
pub mod scheduler;
pub mod state_monitor;
pub mod triggers;

pub use bus::{EventBus, Handler};
pub use cache::RunCache;
pub use error::ProcessorError;
pub use expiring_cache::ExpiringCache;
pub use idle_processor::{IdleCounters, IdleKind, IdleProcessor};
pub use market_timing_checker::MarketTimingChecker;
pub use processor::{ProcessorState, QueueSizeSource, Triggerable, WorkProcessor};
pub use progress::ProgressReporter;
pub use registry::{WorkContext, WorkHandler, WorkRegistry, WorkType, WorkTypeBuilder};
pub use scheduler::Scheduler;
pub use state_monitor::StateMonitor;
