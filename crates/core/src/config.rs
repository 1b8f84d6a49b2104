//! Construction-time configuration structs (spec §9 open question:
//! "retry backoff constants ... come from settings or are hard-coded").
//!
//! Resolved by picking construction config: every knob lives on one of
//! these plain structs, passed into the relevant constructor. Nothing is
//! read from a process-wide global.

use std::time::Duration;

/// Knobs for `sentinel_engine::WorkProcessor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Bounded retry cap for `Transient` errors (spec §5: default 3).
    pub max_retries: u32,
    /// Linear backoff base; actual delay is `attempt * retry_backoff_base`
    /// (spec §5: `retries * 1s`).
    pub retry_backoff_base: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self { max_retries: 3, retry_backoff_base: Duration::from_secs(1) }
    }
}

impl ProcessorConfig {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_backoff_base * attempt
    }
}

/// Knobs for `sentinel_engine::IdleProcessor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleProcessorConfig {
    /// Main queue size at/above which the idle processor stands down
    /// (spec §4.6: default 2).
    pub idle_queue_threshold: usize,
    /// Ticker period between `ProcessOne` calls (spec §4.6: default 30s).
    pub tick_interval: Duration,
}

impl Default for IdleProcessorConfig {
    fn default() -> Self {
        Self { idle_queue_threshold: 2, tick_interval: Duration::from_secs(30) }
    }
}

/// Knobs for `sentinel_engine::StateMonitor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMonitorConfig {
    /// Polling period for the state-hash digest (spec §4.7: "typically every minute").
    pub poll_interval: Duration,
}

impl Default for StateMonitorConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(60) }
    }
}

/// Knobs for `sentinel_engine::Scheduler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Coarse per-minute scan period (spec §4.8).
    pub scan_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { scan_interval: Duration::from_secs(60) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_linear_in_attempt() {
        let cfg = ProcessorConfig::default();
        assert_eq!(cfg.backoff_for_attempt(1), Duration::from_secs(1));
        assert_eq!(cfg.backoff_for_attempt(3), Duration::from_secs(3));
    }
}
