//! Rate limiting error taxonomy

use super::types::Algorithm;
use crate::config::ValidationError;
use crate::storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the admission-control boundary
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The request exceeded its rate limit. Expected and high-frequency;
    /// the boundary maps this to an HTTP 429 equivalent.
    #[error("rate limit exceeded: {limit} requests per {period_secs}s ({algorithm})")]
    Exceeded {
        limit: u64,
        period_secs: u64,
        algorithm: Algorithm,
    },

    /// No engine is registered for the requested algorithm. A
    /// configuration error, fatal at startup or first use; never retried.
    #[error("no rate limiter registered for algorithm: {0}")]
    UnsupportedAlgorithm(Algorithm),

    /// The per-operation policy failed validation.
    #[error("invalid rate limit policy: {0}")]
    InvalidPolicy(#[from] ValidationError),

    /// The shared counter store could not be reached. Transient; the
    /// caller's failure policy decides fail-open vs fail-closed.
    #[error("counter store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl RateLimitError {
    /// HTTP status code equivalent for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RateLimitError::Exceeded { .. } => 429,
            RateLimitError::UnsupportedAlgorithm(_) | RateLimitError::InvalidPolicy(_) => 500,
            RateLimitError::StoreUnavailable(_) => 503,
        }
    }
}
