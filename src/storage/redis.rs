//! Redis-backed counter store
//!
//! Uses server-side Lua scripts (one per algorithm) so each admission check
//! is a single atomic round trip. Any RESP-compatible backend with script
//! support works, including Dragonfly and Valkey.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{scripts, CounterStore, StoreError};

/// Distributed counter store backed by Redis
pub struct RedisCounterStore {
    connection_manager: Arc<ConnectionManager>,
    fixed_window: Script,
    sliding_window_log: Script,
    sliding_window_counter: Script,
    token_bucket: Script,
    leaky_bucket: Script,
}

impl RedisCounterStore {
    /// Connect to the store and verify the connection with a PING
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| {
            warn!("Failed to create Redis client for rate limiting: {}", e);
            StoreError::Unavailable(e)
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            warn!("Failed to connect to Redis for rate limiting: {}", e);
            StoreError::Unavailable(e)
        })?;

        let mut conn = connection_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                warn!("Failed to ping Redis for rate limiting: {}", e);
                StoreError::Unavailable(e)
            })?;

        debug!("Connected to Redis counter store at {}", url);

        Ok(Self {
            connection_manager: Arc::new(connection_manager),
            fixed_window: Script::new(scripts::FIXED_WINDOW),
            sliding_window_log: Script::new(scripts::SLIDING_WINDOW_LOG),
            sliding_window_counter: Script::new(scripts::SLIDING_WINDOW_COUNTER),
            token_bucket: Script::new(scripts::TOKEN_BUCKET),
            leaky_bucket: Script::new(scripts::LEAKY_BUCKET),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_fixed_window(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let mut conn = (*self.connection_manager).clone();
        let count: i64 = self
            .fixed_window
            .key(key)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        u64::try_from(count)
            .map_err(|_| StoreError::Malformed(format!("negative window count: {}", count)))
    }

    async fn acquire_log_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        period_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = (*self.connection_manager).clone();
        let allowed: i64 = self
            .sliding_window_log
            .key(key)
            .arg(now_ms)
            .arg(limit)
            .arg(period_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(allowed == 1)
    }

    async fn acquire_weighted_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        bucket_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = (*self.connection_manager).clone();
        let allowed: i64 = self
            .sliding_window_counter
            .key(key)
            .arg(now_ms)
            .arg(limit)
            .arg(bucket_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(allowed == 1)
    }

    async fn acquire_token(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        refill_per_ms: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = (*self.connection_manager).clone();
        let allowed: i64 = self
            .token_bucket
            .key(key)
            .arg(now_ms)
            .arg(capacity)
            .arg(refill_per_ms)
            .arg(idle_ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(allowed == 1)
    }

    async fn acquire_queue_slot(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        drain_per_sec: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = (*self.connection_manager).clone();
        let allowed: i64 = self
            .leaky_bucket
            .key(key)
            .arg(now_ms)
            .arg(capacity)
            .arg(drain_per_sec)
            .arg(idle_ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(allowed == 1)
    }
}
