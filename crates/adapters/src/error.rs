use thiserror::Error;

/// Errors surfaced by repository/brokerage/market-hours collaborators.
///
/// Work units map these onto `sentinel_core::WorkError` themselves (spec
/// §7: "Repository errors bubble up to the work unit, where the author
/// decides mapping to the categories above") — this crate only needs to
/// report what went wrong, not how severe it is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("not connected to brokerage")]
    NotConnected,
    #[error("unknown security: {0}")]
    UnknownSecurity(String),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("brokerage error: {0}")]
    Brokerage(String),
}
