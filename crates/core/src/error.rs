//! The work-unit error taxonomy (spec §7).
//!
//! `WorkError` is what a work type's `execute` returns; the processor maps
//! it onto retry/history/logging policy. Work units never construct
//! `Panic` themselves — it is produced only by the processor's panic-
//! catching boundary (see `sentinel_engine::processor`).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The cancellation token fired; the caller returned early.
    /// Bypasses the retry policy; recorded in history with a distinguishable reason.
    #[error("cancelled")]
    Cancelled,

    /// I/O, network, or database contention — eligible for bounded retry.
    #[error("transient error: {0}")]
    Transient(String),

    /// Invalid input, missing dependency output, schema mismatch — not retried.
    #[error("permanent error: {0}")]
    Permanent(String),

    /// A panic was caught at the processor boundary. Treated like `Permanent`
    /// except the message always notes the abort explicitly.
    #[error("work unit panicked: {0}")]
    Panic(String),
}

impl WorkError {
    /// Whether the processor's retry policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkError::Transient(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkError::Cancelled)
    }

    /// The string recorded in job history / emitted on `JobFailed`.
    pub fn reason(&self) -> String {
        match self {
            WorkError::Cancelled => "cancelled".to_string(),
            WorkError::Transient(msg) | WorkError::Permanent(msg) => msg.clone(),
            WorkError::Panic(msg) => format!("panic: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(WorkError::Transient("timeout".into()).is_retryable());
        assert!(!WorkError::Permanent("bad input".into()).is_retryable());
        assert!(!WorkError::Cancelled.is_retryable());
        assert!(!WorkError::Panic("boom".into()).is_retryable());
    }

    #[test]
    fn cancelled_reason_is_distinguishable() {
        assert_eq!(WorkError::Cancelled.reason(), "cancelled");
    }
}
