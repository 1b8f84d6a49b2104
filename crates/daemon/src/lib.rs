//! sentinel-daemon: wires the work-orchestration core into a runnable
//! process (binary `sentineld`).
//!
//! Concrete brokerage/database/market-hours adapters are out of scope
//! (spec §1 Non-goals), so this crate wires `sentinel-adapters`'
//! `test-support` fakes as its runnable demonstration runtime and
//! registers the planner/dividend/trading work-type sets spec §4.7 and
//! §2 name — the part of the system that is actually this crate's to own.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod runtime;
pub mod work_types;

pub use runtime::Runtime;
