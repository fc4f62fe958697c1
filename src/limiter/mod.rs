//! Rate limiting engines
//!
//! One engine per [`Algorithm`], each implementing [`RateLimiter`] over a
//! shared [`CounterStore`](crate::storage::CounterStore). Engines are
//! stateless: all counter state lives in the store, so any number of
//! process instances sharing a store enforce one global limit.
//!
//! Engines build their store keys as
//! `{prefix}:{algorithm}:{derived_key}` so algorithms never collide on the
//! same logical key.

pub mod error;
pub mod fixed_window;
pub mod leaky_bucket;
pub mod registry;
pub mod sliding_window_counter;
pub mod sliding_window_log;
pub mod token_bucket;
pub mod types;

pub use error::RateLimitError;
pub use fixed_window::FixedWindowLimiter;
pub use leaky_bucket::LeakyBucketLimiter;
pub use registry::LimiterRegistry;
pub use sliding_window_counter::SlidingWindowCounterLimiter;
pub use sliding_window_log::SlidingWindowLogLimiter;
pub use token_bucket::TokenBucketLimiter;
pub use types::Algorithm;

use async_trait::async_trait;
use std::time::Duration;

/// A rate limiting engine for one algorithm
///
/// `try_acquire` is the single admission primitive: it atomically records
/// the request if admitted and returns the decision. A denial never
/// advances the key's consumption state beyond what the algorithm itself
/// prescribes (fixed-window counts every arrival by design; the others do
/// not).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// The algorithm this engine implements
    fn algorithm(&self) -> Algorithm;

    /// Check and record one request for `key` under the given limit and
    /// period. Returns `Ok(true)` if admitted, `Ok(false)` if denied.
    async fn try_acquire(
        &self,
        key: &str,
        limit: u64,
        period: Duration,
    ) -> Result<bool, RateLimitError>;
}

impl std::fmt::Debug for dyn RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}
