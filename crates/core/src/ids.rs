//! Lightweight identifiers shared across the work-orchestration core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A work-type id, of the form `"domain:action"` (e.g. `"planner:weights"`).
///
/// Newtype over `String` rather than a bare `String` so registry/cache
/// lookups can't accidentally mix work-type ids with subject ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(String);

impl WorkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `"domain"` half of a `"domain:action"` id.
    pub fn domain(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The entity a work unit operates on. The empty string means "global"
/// (one invocation); any other value means "one invocation per subject".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub const GLOBAL: &'static str = "";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn global() -> Self {
        Self(String::new())
    }

    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            write!(f, "<global>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Opaque handle returned by `EventBus::subscribe`, consumed by
/// `EventBus::unsubscribe`. Carries the event kind it was registered
/// against so the bus doesn't need a second lookup to find the right
/// subscriber list on unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub(crate) kind: crate::event::EventKind,
    pub(crate) id: u64,
}

impl Subscription {
    /// Constructed by `sentinel_engine::EventBus::subscribe`, which owns
    /// the monotonic id counter; nothing else should mint one.
    pub fn new(kind: crate::event::EventKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> crate::event::EventKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
