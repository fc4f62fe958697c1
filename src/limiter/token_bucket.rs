//! Token bucket rate limiting
//!
//! Each key owns a bucket of `limit` tokens refilled continuously at
//! `limit / period` tokens per millisecond. A request consumes one token;
//! a fresh key starts with a full bucket, so bursts up to the limit are
//! admitted immediately. Long-run throughput converges on the refill rate.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{current_time_millis, Algorithm};
use super::{RateLimitError, RateLimiter};
use crate::storage::CounterStore;

pub struct TokenBucketLimiter {
    store: Arc<dyn CounterStore>,
    prefix: String,
    idle_ttl_secs: u64,
}

impl TokenBucketLimiter {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str, idle_ttl_secs: u64) -> Self {
        Self {
            store,
            prefix: key_prefix.to_string(),
            idle_ttl_secs,
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucketLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::TokenBucket
    }

    async fn try_acquire(
        &self,
        key: &str,
        limit: u64,
        period: Duration,
    ) -> Result<bool, RateLimitError> {
        counter!("rate_limiter_requests_total", "algorithm" => self.algorithm().as_str())
            .increment(1);

        let now_ms = current_time_millis();
        let refill_per_ms = limit as f64 / period.as_millis() as f64;
        let redis_key = format!("{}:token_bucket:{}", self.prefix, key);

        let allowed = self
            .store
            .acquire_token(&redis_key, now_ms, limit, refill_per_ms, self.idle_ttl_secs)
            .await?;

        if allowed {
            counter!("rate_limiter_requests_allowed", "algorithm" => self.algorithm().as_str())
                .increment(1);
        } else {
            counter!("rate_limiter_requests_rejected", "algorithm" => self.algorithm().as_str())
                .increment(1);
            debug!(key = %redis_key, limit = limit, "Token bucket exhausted");
        }
        Ok(allowed)
    }
}
