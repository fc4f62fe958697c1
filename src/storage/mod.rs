//! Counter storage backends
//!
//! All correctness-critical rate limit state lives here, behind the
//! [`CounterStore`] trait:
//! - Redis (or any RESP-compatible store) for distributed, production use
//! - In-memory for development and single-instance deployments
//!
//! Every trait method is a single atomic read-check-update round trip
//! against one key: no caller ever observes a partially-applied cycle from
//! another concurrent caller touching the same key. The Redis backend gets
//! this from server-side Lua scripts; the in-memory backend holds an async
//! mutex across the whole cycle.

pub mod memory;
pub mod redis;
mod scripts;

pub use memory::InMemoryCounterStore;
pub use redis::RedisCounterStore;

use async_trait::async_trait;
use thiserror::Error;

/// Counter store failure, distinct from a rate limit denial
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or never received the command
    #[error("counter store request failed: {0}")]
    Unavailable(#[from] ::redis::RedisError),

    /// The backend returned state the engine cannot interpret
    #[error("counter store returned malformed state: {0}")]
    Malformed(String),
}

/// One atomic read-check-update round trip per method, shared by all
/// process instances. Rows are created on first use, mutated in place and
/// removed only by TTL expiry; the engines never delete them.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the fixed-window row and return the updated count.
    /// `ttl_secs` is applied only when the increment creates the row.
    async fn incr_fixed_window(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError>;

    /// Prune log entries older than `now_ms - period_ms`, then append the
    /// current timestamp iff fewer than `limit` entries remain. Returns
    /// whether the request was admitted. The row TTL is the period.
    async fn acquire_log_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        period_ms: u64,
    ) -> Result<bool, StoreError>;

    /// Two-bucket weighted sliding window: admit iff
    /// `previous * (1 - elapsed_fraction) + current < limit`, incrementing
    /// the current bucket on admission. TTLs are twice the bucket size for
    /// the current row and one bucket size for a nonzero previous row.
    async fn acquire_weighted_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        bucket_ms: u64,
    ) -> Result<bool, StoreError>;

    /// Refill the token bucket by `elapsed_ms * refill_per_ms` (capped at
    /// `capacity`), then consume one token if available. State is persisted
    /// on denial too, so the next refill computation stays correct. The
    /// idle TTL is refreshed on every call.
    async fn acquire_token(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        refill_per_ms: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError>;

    /// Drain `floor(elapsed_secs * drain_per_sec)` requests from the queue,
    /// then enqueue the current request iff the queue is below `capacity`.
    /// State is persisted on denial too. The idle TTL is refreshed on
    /// every call.
    async fn acquire_queue_slot(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        drain_per_sec: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError>;
}
