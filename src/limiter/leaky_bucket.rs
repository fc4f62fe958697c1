//! Leaky bucket rate limiting
//!
//! Each key owns a bounded queue drained at `limit / period` requests per
//! second. A request is admitted iff the queue is below capacity, which by
//! default equals the limit. Unlike the token bucket, admitted bursts do
//! not translate into immediate throughput: output is smoothed to the
//! drain rate.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{current_time_millis, Algorithm};
use super::{RateLimitError, RateLimiter};
use crate::storage::CounterStore;

pub struct LeakyBucketLimiter {
    store: Arc<dyn CounterStore>,
    prefix: String,
    idle_ttl_secs: u64,
    /// Queue capacity override; defaults to the policy limit
    capacity: Option<u64>,
}

impl LeakyBucketLimiter {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str, idle_ttl_secs: u64) -> Self {
        Self {
            store,
            prefix: key_prefix.to_string(),
            idle_ttl_secs,
            capacity: None,
        }
    }

    /// Decouple the burst capacity from the drain rate. With the default
    /// coupling a policy of 10 per minute also queues up to 10 requests;
    /// this sets the queue bound independently.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

#[async_trait]
impl RateLimiter for LeakyBucketLimiter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LeakyBucket
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
        let drain_per_sec = limit as f64 / period.as_secs_f64();
        let capacity = self.capacity.unwrap_or(limit);
        let redis_key = format!("{}:leaky_bucket:{}", self.prefix, key);

        let allowed = self
            .store
            .acquire_queue_slot(
                &redis_key,
                now_ms,
                capacity,
                drain_per_sec,
                self.idle_ttl_secs,
            )
            .await?;

        if allowed {
            counter!("rate_limiter_requests_allowed", "algorithm" => self.algorithm().as_str())
                .increment(1);
        } else {
            counter!("rate_limiter_requests_rejected", "algorithm" => self.algorithm().as_str())
                .increment(1);
            debug!(key = %redis_key, capacity = capacity, "Leaky bucket full");
        }
        Ok(allowed)
    }
}
