//! `sentineld`: the Sentinel work-orchestration core as a runnable process.
//!
//! Concrete brokerage/database/HTTP adapters are out of scope (spec §1);
//! this binary wires the `test-support` fakes as a runnable demonstration
//! of the core itself — the Event Bus, Work Processor, Idle Processor,
//! State-Hash Monitor, and Scheduler all run for real, against an
//! in-memory portfolio.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use sentinel_core::{IdleProcessorConfig, ProcessorConfig, SchedulerConfig, StateMonitorConfig};
use sentinel_daemon::env;
use sentinel_daemon::runtime::{Runtime, RuntimeConfig};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let state_dir = env::state_dir();
    if let Err(e) = std::fs::create_dir_all(&state_dir) {
        tracing::warn!(error = %e, path = %state_dir.display(), "failed to create state dir");
    }

    let mut processor = ProcessorConfig::default();
    if let Some(max_retries) = env::max_retries() {
        processor.max_retries = max_retries;
    }

    let mut idle = IdleProcessorConfig::default();
    if let Some(interval) = env::idle_tick_interval_ms() {
        idle.tick_interval = interval;
    }

    let mut state_monitor = StateMonitorConfig::default();
    if let Some(interval) = env::state_monitor_interval_ms() {
        state_monitor.poll_interval = interval;
    }

    let mut scheduler = SchedulerConfig::default();
    if let Some(interval) = env::scheduler_scan_interval_ms() {
        scheduler.scan_interval = interval;
    }

    let runtime = Runtime::new(RuntimeConfig { state_dir, processor, idle, state_monitor, scheduler });

    tracing::info!("sentineld starting");
    runtime.start();

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }

    runtime.stop().await;
    tracing::info!("sentineld stopped");
}
