use thiserror::Error;

/// Errors the engine crate itself can surface (not the per-work-unit
/// taxonomy, which is `sentinel_core::WorkError`).
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("work type {0} depends on unregistered work type {1}")]
    UnknownDependency(String, String),
    #[error("storage error: {0}")]
    Storage(#[from] sentinel_storage::StoreError),
    #[error("dependency cycle detected involving work type {0}")]
    DependencyCycle(String),
}
