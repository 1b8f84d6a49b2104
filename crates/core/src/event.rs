//! Domain events delivered through the event bus.
//!
//! A closed enumeration rather than a stringly typed topic, so every
//! subscriber and every `match` over `Event` is exhaustive-checked by the
//! compiler. Serializes with `{"type": "event:name", ...fields}`, matching
//! the wire shape of the teacher's own event enum.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::hash::StateHash;
use crate::ids::{SubjectId, WorkId};

/// The discriminant of an `Event`, used as the subscription key.
///
/// Kept separate from `Event` itself because `EventBus::subscribe` takes a
/// kind, not a populated event — callers haven't got field values yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    StateChanged,
    RecommendationsReady,
    MarketsStatusChanged,
    DividendDetected,
    JobStarted,
    JobProgress,
    JobCompleted,
    JobFailed,
    PriceUpdated,
    ScoreUpdated,
    PlanGenerated,
    SystemStatusChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StateChanged => "state:changed",
            EventKind::RecommendationsReady => "recommendations:ready",
            EventKind::MarketsStatusChanged => "markets:status_changed",
            EventKind::DividendDetected => "dividend:detected",
            EventKind::JobStarted => "job:started",
            EventKind::JobProgress => "job:progress",
            EventKind::JobCompleted => "job:completed",
            EventKind::JobFailed => "job:failed",
            EventKind::PriceUpdated => "price:updated",
            EventKind::ScoreUpdated => "score:updated",
            EventKind::PlanGenerated => "plan:generated",
            EventKind::SystemStatusChanged => "system:status_changed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A domain event: `(type, module, timestamp, data)`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "state:changed")]
    StateChanged { module: String, timestamp: u64, old_hash: StateHash, new_hash: StateHash },

    #[serde(rename = "recommendations:ready")]
    RecommendationsReady { module: String, timestamp: u64, count: usize },

    #[serde(rename = "markets:status_changed")]
    MarketsStatusChanged { module: String, timestamp: u64, open_markets: Vec<String> },

    #[serde(rename = "dividend:detected")]
    DividendDetected { module: String, timestamp: u64, isin: String, amount_minor: i64 },

    #[serde(rename = "job:started")]
    JobStarted { module: String, timestamp: u64, work_id: WorkId, subject: SubjectId },

    #[serde(rename = "job:progress")]
    JobProgress {
        module: String,
        timestamp: u64,
        work_id: WorkId,
        subject: SubjectId,
        message: String,
    },

    #[serde(rename = "job:completed")]
    JobCompleted {
        module: String,
        timestamp: u64,
        work_id: WorkId,
        subject: SubjectId,
        duration_ms: u64,
    },

    #[serde(rename = "job:failed")]
    JobFailed {
        module: String,
        timestamp: u64,
        work_id: WorkId,
        subject: SubjectId,
        error_message: String,
        duration_ms: u64,
    },

    #[serde(rename = "price:updated")]
    PriceUpdated { module: String, timestamp: u64, isin: String },

    #[serde(rename = "score:updated")]
    ScoreUpdated { module: String, timestamp: u64, isin: String },

    #[serde(rename = "plan:generated")]
    PlanGenerated { module: String, timestamp: u64, trade_count: usize },

    #[serde(rename = "system:status_changed")]
    SystemStatusChanged { module: String, timestamp: u64, status: String, detail: HashMap<String, String> },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StateChanged { .. } => EventKind::StateChanged,
            Event::RecommendationsReady { .. } => EventKind::RecommendationsReady,
            Event::MarketsStatusChanged { .. } => EventKind::MarketsStatusChanged,
            Event::DividendDetected { .. } => EventKind::DividendDetected,
            Event::JobStarted { .. } => EventKind::JobStarted,
            Event::JobProgress { .. } => EventKind::JobProgress,
            Event::JobCompleted { .. } => EventKind::JobCompleted,
            Event::JobFailed { .. } => EventKind::JobFailed,
            Event::PriceUpdated { .. } => EventKind::PriceUpdated,
            Event::ScoreUpdated { .. } => EventKind::ScoreUpdated,
            Event::PlanGenerated { .. } => EventKind::PlanGenerated,
            Event::SystemStatusChanged { .. } => EventKind::SystemStatusChanged,
        }
    }

    pub fn module(&self) -> &str {
        match self {
            Event::StateChanged { module, .. }
            | Event::RecommendationsReady { module, .. }
            | Event::MarketsStatusChanged { module, .. }
            | Event::DividendDetected { module, .. }
            | Event::JobStarted { module, .. }
            | Event::JobProgress { module, .. }
            | Event::JobCompleted { module, .. }
            | Event::JobFailed { module, .. }
            | Event::PriceUpdated { module, .. }
            | Event::ScoreUpdated { module, .. }
            | Event::PlanGenerated { module, .. }
            | Event::SystemStatusChanged { module, .. } => module,
        }
    }

    /// One-line summary suitable for a `tracing` field, never the full payload.
    pub fn log_summary(&self) -> String {
        match self {
            Event::StateChanged { old_hash, new_hash, .. } => {
                format!("{old_hash} -> {new_hash}")
            }
            Event::RecommendationsReady { count, .. } => format!("count={count}"),
            Event::MarketsStatusChanged { open_markets, .. } => {
                format!("open={}", open_markets.join(","))
            }
            Event::DividendDetected { isin, amount_minor, .. } => {
                format!("isin={isin} amount_minor={amount_minor}")
            }
            Event::JobStarted { work_id, subject, .. } => format!("{work_id} subject={subject}"),
            Event::JobProgress { work_id, subject, message, .. } => {
                format!("{work_id} subject={subject} {message}")
            }
            Event::JobCompleted { work_id, subject, duration_ms, .. } => {
                format!("{work_id} subject={subject} duration_ms={duration_ms}")
            }
            Event::JobFailed { work_id, subject, error_message, duration_ms, .. } => {
                format!("{work_id} subject={subject} duration_ms={duration_ms} error={error_message}")
            }
            Event::PriceUpdated { isin, .. } | Event::ScoreUpdated { isin, .. } => {
                format!("isin={isin}")
            }
            Event::PlanGenerated { trade_count, .. } => format!("trade_count={trade_count}"),
            Event::SystemStatusChanged { status, .. } => format!("status={status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let ev = Event::RecommendationsReady { module: "planner".into(), timestamp: 1, count: 3 };
        assert_eq!(ev.kind(), EventKind::RecommendationsReady);
        assert_eq!(ev.kind().as_str(), "recommendations:ready");
    }

    #[test]
    fn serializes_with_tagged_type_field() {
        let ev = Event::JobStarted {
            module: "engine".into(),
            timestamp: 42,
            work_id: WorkId::new("planner:weights"),
            subject: SubjectId::global(),
        };
        let json = serde_json::to_value(&ev).expect("serialize");
        assert_eq!(json["type"], "job:started");
        assert_eq!(json["work_id"], "planner:weights");
    }
}
