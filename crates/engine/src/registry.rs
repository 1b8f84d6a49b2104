//! Work Registry (spec §4.3): declarative `WorkType` descriptors, FIFO
//! registration order, dependency lookups.

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sentinel_core::{MarketTiming, Priority, SubjectId, WorkError, WorkId};
use tokio_util::sync::CancellationToken;

use crate::cache::RunCache;
use crate::error::ProcessorError;
use crate::progress::ProgressReporter;

/// Runtime state handed to `find_subjects`/`execute`: the shared run cache
/// plus the wall-clock the processor observed at the start of this tick.
/// Deliberately does not carry adapter handles — a `WorkHandler` closes
/// over whatever repositories/brokerage/planner traits it needs at
/// registration time (dependency injection at construction, spec §9).
#[derive(Clone)]
pub struct WorkContext {
    pub cache: Arc<RunCache>,
    pub now_epoch: u64,
}

/// The worker half of a `WorkType`: subject discovery and idempotent
/// execution. A trait object so the registry can hold heterogeneous work
/// types behind one `Vec`, mirroring the spec's "function" fields.
#[async_trait]
pub trait WorkHandler: Send + Sync {
    /// Subjects currently needing this work. Empty means nothing to do.
    /// Must be pure w.r.t. external state at call time — no side effects.
    async fn find_subjects(&self, ctx: &WorkContext) -> Vec<SubjectId>;

    /// Idempotent: may be invoked more than once for the same subject
    /// (retries, restarts) and must not assume state beyond what it reads
    /// from repositories and the run cache.
    async fn execute(
        &self,
        ctx: &WorkContext,
        subject: &SubjectId,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), WorkError>;
}

/// A declarative unit of work (spec §3).
#[derive(Clone)]
pub struct WorkType {
    pub id: WorkId,
    pub depends_on: Vec<WorkId>,
    pub market_timing: MarketTiming,
    /// Minimum wall-clock gap between successful executions. `None` means
    /// event-driven only (no interval gate).
    pub interval: Option<Duration>,
    /// Advisory only — see `sentinel_core::priority`. Never consulted by
    /// the processor's ordering.
    pub priority: Priority,
    pub handler: Arc<dyn WorkHandler>,
}

impl WorkType {
    pub fn builder(id: impl Into<WorkId>, handler: Arc<dyn WorkHandler>) -> WorkTypeBuilder {
        WorkTypeBuilder {
            id: id.into(),
            depends_on: Vec::new(),
            market_timing: MarketTiming::AnyTime,
            interval: None,
            priority: Priority::default(),
            handler,
        }
    }
}

pub struct WorkTypeBuilder {
    id: WorkId,
    depends_on: Vec<WorkId>,
    market_timing: MarketTiming,
    interval: Option<Duration>,
    priority: Priority,
    handler: Arc<dyn WorkHandler>,
}

impl WorkTypeBuilder {
    pub fn depends_on(mut self, ids: impl IntoIterator<Item = WorkId>) -> Self {
        self.depends_on = ids.into_iter().collect();
        self
    }

    pub fn market_timing(mut self, timing: MarketTiming) -> Self {
        self.market_timing = timing;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn build(self) -> WorkType {
        WorkType {
            id: self.id,
            depends_on: self.depends_on,
            market_timing: self.market_timing,
            interval: self.interval,
            priority: self.priority,
            handler: self.handler,
        }
    }
}

/// Registration-order-preserving table of `WorkType`s (spec §4.3).
///
/// Guarded by a single `RwLock`; every query clones its result so a caller
/// can't mutate registry internals through a borrowed reference.
#[derive(Default)]
pub struct WorkRegistry {
    entries: RwLock<IndexMap<WorkId, WorkType>>,
}

impl WorkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `work_type`. Re-registering an existing id removes its
    /// old slot and appends at the end — resolved open question, spec §9:
    /// "registry.go removes then appends" is the behavior this keeps.
    pub fn register(&self, work_type: WorkType) {
        let mut entries = self.entries.write();
        entries.shift_remove(&work_type.id);
        entries.insert(work_type.id.clone(), work_type);
    }

    pub fn get(&self, id: &WorkId) -> Option<WorkType> {
        self.entries.read().get(id).cloned()
    }

    pub fn has(&self, id: &WorkId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn remove(&self, id: &WorkId) -> Option<WorkType> {
        self.entries.write().shift_remove(id)
    }

    /// All work types, in FIFO registration order.
    pub fn all(&self) -> Vec<WorkType> {
        self.entries.read().values().cloned().collect()
    }

    pub fn get_dependencies(&self, id: &WorkId) -> Vec<WorkId> {
        self.entries.read().get(id).map(|w| w.depends_on.clone()).unwrap_or_default()
    }

    pub fn get_dependents(&self, id: &WorkId) -> Vec<WorkId> {
        self.entries
            .read()
            .values()
            .filter(|w| w.depends_on.contains(id))
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Checks the two registry invariants spec §3 names: every `depends_on`
    /// id resolves to a registered entry, and the dependency graph has no
    /// cycle. Called by `WorkProcessor` at construction so a misconfigured
    /// registry is caught once, up front, rather than silently starving a
    /// work type every tick (spec's "a warning may be logged" is satisfied
    /// by the caller logging this `Err` rather than this method logging
    /// itself, keeping the registry free of a logging dependency on its
    /// caller's policy).
    pub fn validate(&self) -> Result<(), ProcessorError> {
        let entries = self.entries.read();
        for wt in entries.values() {
            for dep in &wt.depends_on {
                if !entries.contains_key(dep) {
                    return Err(ProcessorError::UnknownDependency(wt.id.to_string(), dep.to_string()));
                }
            }
        }
        if let Some(id) = Self::find_cycle(&entries) {
            return Err(ProcessorError::DependencyCycle(id.to_string()));
        }
        Ok(())
    }

    /// Depth-first search over the `depends_on` edges; returns the id of a
    /// work type found to participate in a cycle, if any.
    fn find_cycle(entries: &IndexMap<WorkId, WorkType>) -> Option<WorkId> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<WorkId, Mark> = HashMap::new();

        fn visit(id: &WorkId, entries: &IndexMap<WorkId, WorkType>, marks: &mut HashMap<WorkId, Mark>) -> bool {
            match marks.get(id) {
                Some(Mark::Done) => return false,
                Some(Mark::Visiting) => return true,
                None => {}
            }
            marks.insert(id.clone(), Mark::Visiting);
            if let Some(wt) = entries.get(id) {
                for dep in &wt.depends_on {
                    if visit(dep, entries, marks) {
                        return true;
                    }
                }
            }
            marks.insert(id.clone(), Mark::Done);
            false
        }

        for id in entries.keys() {
            if visit(id, entries, &mut marks) {
                return Some(id.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl WorkHandler for NoopHandler {
        async fn find_subjects(&self, _ctx: &WorkContext) -> Vec<SubjectId> {
            Vec::new()
        }

        async fn execute(
            &self,
            _ctx: &WorkContext,
            _subject: &SubjectId,
            _progress: &ProgressReporter,
            _cancel: &CancellationToken,
        ) -> Result<(), WorkError> {
            Ok(())
        }
    }

    fn work_type(id: &str) -> WorkType {
        WorkType::builder(WorkId::new(id), Arc::new(NoopHandler)).build()
    }

    #[test]
    fn all_preserves_fifo_registration_order() {
        let registry = WorkRegistry::new();
        registry.register(work_type("a"));
        registry.register(work_type("b"));
        registry.register(work_type("c"));
        let ids: Vec<_> = registry.all().into_iter().map(|w| w.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn reregistering_moves_entry_to_the_end() {
        let registry = WorkRegistry::new();
        registry.register(work_type("a"));
        registry.register(work_type("b"));
        registry.register(work_type("a"));
        let ids: Vec<_> = registry.all().into_iter().map(|w| w.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn remove_then_reregister_yields_exactly_one_entry() {
        let registry = WorkRegistry::new();
        registry.register(work_type("x"));
        registry.remove(&WorkId::new("x"));
        registry.register(work_type("x"));
        let all = registry.all();
        assert_eq!(all.iter().filter(|w| w.id.as_str() == "x").count(), 1);
    }

    #[test]
    fn get_dependents_finds_reverse_edges() {
        let registry = WorkRegistry::new();
        registry.register(work_type("a"));
        registry.register(
            WorkType::builder(WorkId::new("b"), Arc::new(NoopHandler))
                .depends_on([WorkId::new("a")])
                .build(),
        );
        assert_eq!(registry.get_dependents(&WorkId::new("a")), vec![WorkId::new("b")]);
    }

    #[test]
    fn validate_passes_for_a_well_formed_registry() {
        let registry = WorkRegistry::new();
        registry.register(work_type("a"));
        registry.register(
            WorkType::builder(WorkId::new("b"), Arc::new(NoopHandler))
                .depends_on([WorkId::new("a")])
                .build(),
        );
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn validate_rejects_a_dependency_on_an_unregistered_id() {
        let registry = WorkRegistry::new();
        registry.register(
            WorkType::builder(WorkId::new("b"), Arc::new(NoopHandler))
                .depends_on([WorkId::new("missing")])
                .build(),
        );
        assert!(matches!(registry.validate(), Err(ProcessorError::UnknownDependency(_, _))));
    }

    #[test]
    fn validate_rejects_a_dependency_cycle() {
        let registry = WorkRegistry::new();
        registry.register(
            WorkType::builder(WorkId::new("a"), Arc::new(NoopHandler))
                .depends_on([WorkId::new("b")])
                .build(),
        );
        registry.register(
            WorkType::builder(WorkId::new("b"), Arc::new(NoopHandler))
                .depends_on([WorkId::new("a")])
                .build(),
        );
        assert!(matches!(registry.validate(), Err(ProcessorError::DependencyCycle(_))));
    }
}
