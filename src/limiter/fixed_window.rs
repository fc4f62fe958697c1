//! Fixed window rate limiting
//!
//! Requests are counted in non-overlapping windows aligned to the clock:
//! window start = `floor(now / period) * period`. Cheapest algorithm, one
//! counter per window, but a client can burst up to twice the limit across
//! a window boundary (the tail of one window plus the head of the next).

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{current_time_secs, Algorithm};
use super::{RateLimitError, RateLimiter};
use crate::config::ValidationError;
use crate::storage::CounterStore;

pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    prefix: String,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str) -> Self {
        Self {
            store,
            prefix: key_prefix.to_string(),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::FixedWindow
    }

    async fn try_acquire(
        &self,
        key: &str,
        limit: u64,
        period: Duration,
    ) -> Result<bool, RateLimitError> {
        counter!("rate_limiter_requests_total", "algorithm" => self.algorithm().as_str())
            .increment(1);

        // Windows are clock-aligned at second granularity
        let period_secs = period.as_secs();
        if period_secs == 0 {
            return Err(RateLimitError::InvalidPolicy(ValidationError::policy(
                "fixed window period must be at least one second",
            )));
        }
        let now = current_time_secs();
        let window_start = (now / period_secs) * period_secs;
        // TTL is the remainder of the window, so the row disappears as
        // soon as the window it counts is over.
        let ttl_secs = window_start + period_secs - now;
        let redis_key = format!("{}:fixed_window:{}:{}", self.prefix, key, window_start);

        let count = self.store.incr_fixed_window(&redis_key, ttl_secs).await?;
        let allowed = count <= limit;

        if allowed {
            counter!("rate_limiter_requests_allowed", "algorithm" => self.algorithm().as_str())
                .increment(1);
        } else {
            counter!("rate_limiter_requests_rejected", "algorithm" => self.algorithm().as_str())
                .increment(1);
            debug!(
                key = %redis_key,
                count = count,
                limit = limit,
                "Fixed window limit exceeded"
            );
        }
        Ok(allowed)
    }
}
