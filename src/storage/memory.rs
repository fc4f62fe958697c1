//! In-memory counter store for development and single-instance deployments
//!
//! Every operation runs its full read-check-update cycle while holding one
//! async mutex, which gives the same single-key serializability guarantee
//! as the Redis backend's Lua scripts. Expired rows are skipped on access;
//! [`InMemoryCounterStore::purge_expired`] reclaims their memory.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{CounterStore, StoreError};
use crate::limiter::types::{current_time_millis, LeakyBucketState, TokenBucketState};

/// Counter state, one shape per algorithm namespace
enum RowState {
    Count(u64),
    Log(Vec<u64>),
    Tokens(TokenBucketState),
    Queue(LeakyBucketState),
}

struct Row {
    state: RowState,
    expires_at_ms: u64,
}

/// Process-local counter store
#[derive(Default)]
pub struct InMemoryCounterStore {
    rows: Mutex<HashMap<String, Row>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired row. Reads already skip expired rows, so this
    /// only reclaims memory for keys that are never touched again.
    pub async fn purge_expired(&self) {
        let now = current_time_millis();
        let mut rows = self.rows.lock().await;
        rows.retain(|_, row| row.expires_at_ms > now);
    }

    /// Number of live rows, for tests and diagnostics
    pub async fn len(&self) -> usize {
        let now = current_time_millis();
        let rows = self.rows.lock().await;
        rows.values().filter(|row| row.expires_at_ms > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Live count for a counter row; expired or absent rows read as zero
fn live_count(rows: &HashMap<String, Row>, key: &str, now_ms: u64) -> u64 {
    match rows.get(key) {
        Some(Row {
            state: RowState::Count(count),
            expires_at_ms,
        }) if *expires_at_ms > now_ms => *count,
        _ => 0,
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr_fixed_window(&self, key: &str, ttl_secs: u64) -> Result<u64, StoreError> {
        let now_ms = current_time_millis();
        let mut rows = self.rows.lock().await;

        let (count, expires_at_ms) = match rows.remove(key) {
            Some(Row {
                state: RowState::Count(count),
                expires_at_ms,
            }) if expires_at_ms > now_ms => (count + 1, expires_at_ms),
            _ => (1, now_ms + ttl_secs * 1000),
        };
        rows.insert(
            key.to_string(),
            Row {
                state: RowState::Count(count),
                expires_at_ms,
            },
        );
        Ok(count)
    }

    async fn acquire_log_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        period_ms: u64,
    ) -> Result<bool, StoreError> {
        let cutoff = now_ms.saturating_sub(period_ms);
        let mut rows = self.rows.lock().await;

        let (mut entries, old_expires_at_ms) = match rows.remove(key) {
            Some(Row {
                state: RowState::Log(entries),
                expires_at_ms,
            }) if expires_at_ms > now_ms => (entries, expires_at_ms),
            _ => (Vec::new(), now_ms + period_ms),
        };

        entries.retain(|timestamp| *timestamp > cutoff);
        let allowed = (entries.len() as u64) < limit;
        if allowed {
            entries.push(now_ms);
        }

        // TTL is refreshed on admission only, matching the Redis script
        let expires_at_ms = if allowed {
            now_ms + period_ms
        } else {
            old_expires_at_ms
        };
        rows.insert(
            key.to_string(),
            Row {
                state: RowState::Log(entries),
                expires_at_ms,
            },
        );
        Ok(allowed)
    }

    async fn acquire_weighted_slot(
        &self,
        key: &str,
        now_ms: u64,
        limit: u64,
        bucket_ms: u64,
    ) -> Result<bool, StoreError> {
        let current_window = (now_ms / bucket_ms) * bucket_ms;
        let previous_window = current_window.saturating_sub(bucket_ms);
        let current_key = format!("{}:{}", key, current_window);
        let previous_key = format!("{}:{}", key, previous_window);

        let mut rows = self.rows.lock().await;

        let current_count = live_count(&rows, &current_key, now_ms);
        let previous_count = live_count(&rows, &previous_key, now_ms);

        let elapsed = (now_ms - current_window) as f64 / bucket_ms as f64;
        let weighted = previous_count as f64 * (1.0 - elapsed) + current_count as f64;

        if weighted < limit as f64 {
            rows.insert(
                current_key,
                Row {
                    state: RowState::Count(current_count + 1),
                    expires_at_ms: now_ms + 2 * bucket_ms,
                },
            );
            if previous_count > 0 {
                if let Some(row) = rows.get_mut(&previous_key) {
                    row.expires_at_ms = now_ms + bucket_ms;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn acquire_token(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        refill_per_ms: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;

        let mut state = match rows.remove(key) {
            Some(Row {
                state: RowState::Tokens(state),
                expires_at_ms,
            }) if expires_at_ms > now_ms => state,
            _ => TokenBucketState::full(capacity, now_ms),
        };

        let elapsed_ms = now_ms.saturating_sub(state.last_refill);
        state.tokens = (state.tokens + elapsed_ms as f64 * refill_per_ms).min(capacity as f64);
        state.last_refill = now_ms;

        let allowed = state.tokens >= 1.0;
        if allowed {
            state.tokens -= 1.0;
        }

        rows.insert(
            key.to_string(),
            Row {
                state: RowState::Tokens(state),
                expires_at_ms: now_ms + idle_ttl_secs * 1000,
            },
        );
        Ok(allowed)
    }

    async fn acquire_queue_slot(
        &self,
        key: &str,
        now_ms: u64,
        capacity: u64,
        drain_per_sec: f64,
        idle_ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;

        let mut state = match rows.remove(key) {
            Some(Row {
                state: RowState::Queue(state),
                expires_at_ms,
            }) if expires_at_ms > now_ms => state,
            _ => LeakyBucketState::empty(now_ms),
        };

        let elapsed_secs = now_ms.saturating_sub(state.last_process) as f64 / 1000.0;
        let processed = (elapsed_secs * drain_per_sec).floor();
        if processed >= state.queue {
            state.queue = 0.0;
            state.last_process = now_ms;
        } else if processed > 0.0 {
            state.queue -= processed;
            state.last_process += ((processed / drain_per_sec) * 1000.0) as u64;
        }

        let allowed = state.queue < capacity as f64;
        if allowed {
            state.queue += 1.0;
        }

        rows.insert(
            key.to_string(),
            Row {
                state: RowState::Queue(state),
                expires_at_ms: now_ms + idle_ttl_secs * 1000,
            },
        );
        Ok(allowed)
    }
}
