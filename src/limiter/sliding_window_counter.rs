//! Sliding window counter rate limiting
//!
//! Approximates a moving window with two adjacent fixed buckets. The
//! effective count is `previous * (1 - elapsed_fraction) + current`, where
//! `elapsed_fraction` is how far the current bucket has progressed. Memory
//! stays bounded at two counters per key.
//!
//! The window is the configured bucket size, not the policy period: the
//! limit applies per bucket, and the blend only smooths the boundary. The
//! policy's period is accepted for interface uniformity and ignored.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{current_time_millis, Algorithm};
use super::{RateLimitError, RateLimiter};
use crate::storage::CounterStore;

pub struct SlidingWindowCounterLimiter {
    store: Arc<dyn CounterStore>,
    prefix: String,
    bucket: Duration,
}

impl SlidingWindowCounterLimiter {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str, bucket: Duration) -> Self {
        Self {
            store,
            prefix: key_prefix.to_string(),
            bucket,
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowCounterLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindowCounter
    }

    async fn try_acquire(
        &self,
        key: &str,
        limit: u64,
        _period: Duration,
    ) -> Result<bool, RateLimitError> {
        counter!("rate_limiter_requests_total", "algorithm" => self.algorithm().as_str())
            .increment(1);

        let now_ms = current_time_millis();
        let bucket_ms = self.bucket.as_millis() as u64;
        let redis_key = format!("{}:sliding_window_counter:{}", self.prefix, key);

        let allowed = self
            .store
            .acquire_weighted_slot(&redis_key, now_ms, limit, bucket_ms)
            .await?;

        if allowed {
            counter!("rate_limiter_requests_allowed", "algorithm" => self.algorithm().as_str())
                .increment(1);
        } else {
            counter!("rate_limiter_requests_rejected", "algorithm" => self.algorithm().as_str())
                .increment(1);
            debug!(key = %redis_key, limit = limit, "Sliding window counter limit exceeded");
        }
        Ok(allowed)
    }
}
