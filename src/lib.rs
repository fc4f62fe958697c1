//! gatelimit - distributed request admission control
//!
//! Pluggable rate limiting over a shared counter store. Five algorithms
//! (fixed window, sliding window log, sliding window counter, token bucket,
//! leaky bucket) enforce one global limit per key across any number of
//! process instances, with Redis as the production backend and an
//! in-memory store for development and tests.
//!
//! # Modules
//!
//! - [`admission`]: policy-driven admit/deny boundary and key derivation
//! - [`limiter`]: the five engines behind the [`RateLimiter`] trait
//! - [`storage`]: the [`CounterStore`] backends (Redis, in-memory)
//! - [`config`]: layered configuration with validation
//! - [`logging`]: tracing initialization
//!
//! # Quick start
//!
//! ```no_run
//! use gatelimit::{
//!     AdmissionControl, Config, InMemoryCounterStore, LimiterRegistry, RequestContext,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! gatelimit::init_tracing(&config.logging.level);
//!
//! let store = Arc::new(InMemoryCounterStore::new());
//! let registry = Arc::new(LimiterRegistry::all(store, &config.limiter));
//! let control = AdmissionControl::new(registry);
//!
//! let ctx = RequestContext::new("orders.create").with_remote_addr("192.0.2.4");
//! control.admit(&ctx, &config.policy).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Configuration is overridable through the environment, e.g.
//! `GATELIMIT__STORAGE__URL=redis://cache:6379` or
//! `GATELIMIT__POLICY__ALGORITHM=token_bucket`.

pub mod admission;
pub mod config;
pub mod limiter;
pub mod logging;
pub mod storage;

pub use admission::{derive_key, AdmissionControl, FailurePolicy, RequestContext};
pub use config::{Config, ConfigLoadError, KeyType, LimiterConfig, RateLimitPolicy, StorageBackend};
pub use limiter::{Algorithm, LimiterRegistry, RateLimitError, RateLimiter};
pub use logging::init_tracing;
pub use storage::{CounterStore, InMemoryCounterStore, RedisCounterStore, StoreError};
