//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: `SENTINEL_STATE_DIR` > `XDG_STATE_HOME`/sentinel
/// > `~/.local/state/sentinel`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SENTINEL_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("sentinel");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/state/sentinel")
}

/// Override for the state-hash monitor's poll interval, mostly useful to
/// shrink in local/manual testing; production default comes from
/// `StateMonitorConfig::default()`.
pub fn state_monitor_interval_ms() -> Option<Duration> {
    std::env::var("SENTINEL_STATE_MONITOR_MS").ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

pub fn idle_tick_interval_ms() -> Option<Duration> {
    std::env::var("SENTINEL_IDLE_TICK_MS").ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

pub fn scheduler_scan_interval_ms() -> Option<Duration> {
    std::env::var("SENTINEL_SCHEDULER_SCAN_MS").ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

pub fn max_retries() -> Option<u32> {
    std::env::var("SENTINEL_MAX_RETRIES").ok().and_then(|s| s.parse::<u32>().ok())
}
