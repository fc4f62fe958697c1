//! Sliding window log rate limiting
//!
//! Keeps every admitted request's timestamp for the trailing period and
//! admits a new request iff fewer than `limit` timestamps remain after
//! pruning. Exact enforcement with no boundary bursts, at the cost of one
//! stored entry per admitted request. Denied requests are not recorded.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{current_time_millis, Algorithm};
use super::{RateLimitError, RateLimiter};
use crate::storage::CounterStore;

pub struct SlidingWindowLogLimiter {
    store: Arc<dyn CounterStore>,
    prefix: String,
}

impl SlidingWindowLogLimiter {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str) -> Self {
        Self {
            store,
            prefix: key_prefix.to_string(),
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLogLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindowLog
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
        let period_ms = period.as_millis() as u64;
        let redis_key = format!("{}:sliding_window_log:{}", self.prefix, key);

        let allowed = self
            .store
            .acquire_log_slot(&redis_key, now_ms, limit, period_ms)
            .await?;

        if allowed {
            counter!("rate_limiter_requests_allowed", "algorithm" => self.algorithm().as_str())
                .increment(1);
        } else {
            counter!("rate_limiter_requests_rejected", "algorithm" => self.algorithm().as_str())
                .increment(1);
            debug!(key = %redis_key, limit = limit, "Sliding window log limit exceeded");
        }
        Ok(allowed)
    }
}
