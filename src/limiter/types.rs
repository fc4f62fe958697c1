//! Rate limiter types and core data structures

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Rate limiting algorithm identifier
///
/// Each algorithm owns a distinct key namespace so that no two algorithms
/// ever share counter state for the same logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Counts requests in non-overlapping, clock-aligned windows.
    /// Simple, but traffic can burst up to twice the limit across a
    /// window boundary.
    FixedWindow,
    /// Tracks every request timestamp within the trailing period.
    /// Exact, at the cost of one stored entry per admitted request.
    SlidingWindowLog,
    /// Approximates a moving window with two adjacent buckets and a
    /// weighted blend. Memory stays bounded at two counters per key.
    SlidingWindowCounter,
    /// Continuously refilling token pool; allows bursts up to capacity.
    TokenBucket,
    /// Bounded queue drained at a constant rate; smooths throughput.
    LeakyBucket,
}

impl Algorithm {
    /// Key namespace and metric label for this algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::FixedWindow => "fixed_window",
            Algorithm::SlidingWindowLog => "sliding_window_log",
            Algorithm::SlidingWindowCounter => "sliding_window_counter",
            Algorithm::TokenBucket => "token_bucket",
            Algorithm::LeakyBucket => "leaky_bucket",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token bucket state for a single key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBucketState {
    /// Current number of tokens in the bucket
    pub tokens: f64,
    /// Last time the bucket was refilled (Unix timestamp in milliseconds)
    pub last_refill: u64,
}

impl TokenBucketState {
    /// Create a new bucket filled to capacity
    pub fn full(capacity: u64, now_ms: u64) -> Self {
        Self {
            tokens: capacity as f64,
            last_refill: now_ms,
        }
    }
}

/// Leaky bucket state for a single key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakyBucketState {
    /// Number of requests currently queued
    pub queue: f64,
    /// Drain accounting reference point (Unix timestamp in milliseconds)
    pub last_process: u64,
}

impl LeakyBucketState {
    /// Create a new empty queue
    pub fn empty(now_ms: u64) -> Self {
        Self {
            queue: 0.0,
            last_process: now_ms,
        }
    }
}

/// Get current time in milliseconds since Unix epoch
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Get current time in seconds since Unix epoch
pub fn current_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
