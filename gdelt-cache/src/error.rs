//! Errors produced by the cache/coordination layer.

use thiserror::Error;

/// Failure kinds the coordinator and its collaborators can raise.
///
/// These map to `gdelt-api::ErrorCode` at the HTTP boundary; this enum
/// itself carries no HTTP concerns.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(#[from] tokio_postgres::Error),

    #[error("store pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("warehouse call failed: {0}")]
    Upstream(String),

    #[error("deadline elapsed waiting on {0}")]
    Timeout(String),

    #[error("internal invariant violation: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for failures of the durable store itself (unreachable
    /// database, exhausted pool) as opposed to a failed warehouse call.
    /// The coordinator re-raises these instead of folding them into a
    /// partial result, since a caller can't be served at all without
    /// the store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, CacheError::Store(_) | CacheError::Pool(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
