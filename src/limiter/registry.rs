//! Algorithm registry
//!
//! Maps each [`Algorithm`] to its engine instance. Policies select an
//! algorithm by name at admission time; resolving an unregistered one is a
//! configuration error, not a denial.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    Algorithm, FixedWindowLimiter, LeakyBucketLimiter, RateLimitError, RateLimiter,
    SlidingWindowCounterLimiter, SlidingWindowLogLimiter, TokenBucketLimiter,
};
use crate::config::LimiterConfig;
use crate::storage::CounterStore;

#[derive(Default)]
pub struct LimiterRegistry {
    engines: HashMap<Algorithm, Arc<dyn RateLimiter>>,
}

impl LimiterRegistry {
    /// Create an empty registry; engines are added with [`register`](Self::register)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with all five engines over a shared store
    pub fn all(store: Arc<dyn CounterStore>, config: &LimiterConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FixedWindowLimiter::new(
            store.clone(),
            &config.key_prefix,
        )));
        registry.register(Arc::new(SlidingWindowLogLimiter::new(
            store.clone(),
            &config.key_prefix,
        )));
        registry.register(Arc::new(SlidingWindowCounterLimiter::new(
            store.clone(),
            &config.key_prefix,
            Duration::from_secs(config.sliding_window_bucket_secs),
        )));
        registry.register(Arc::new(TokenBucketLimiter::new(
            store.clone(),
            &config.key_prefix,
            config.idle_ttl_secs,
        )));
        registry.register(Arc::new(LeakyBucketLimiter::new(
            store,
            &config.key_prefix,
            config.idle_ttl_secs,
        )));
        registry
    }

    /// Register an engine under its own algorithm, replacing any previous
    /// engine for that algorithm
    pub fn register(&mut self, engine: Arc<dyn RateLimiter>) {
        self.engines.insert(engine.algorithm(), engine);
    }

    /// Look up the engine for an algorithm
    pub fn resolve(&self, algorithm: Algorithm) -> Result<Arc<dyn RateLimiter>, RateLimitError> {
        self.engines
            .get(&algorithm)
            .cloned()
            .ok_or(RateLimitError::UnsupportedAlgorithm(algorithm))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCounterStore;

    #[tokio::test]
    async fn test_all_registers_every_algorithm() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let registry = LimiterRegistry::all(store, &LimiterConfig::default());
        assert_eq!(registry.len(), 5);

        for algorithm in [
            Algorithm::FixedWindow,
            Algorithm::SlidingWindowLog,
            Algorithm::SlidingWindowCounter,
            Algorithm::TokenBucket,
            Algorithm::LeakyBucket,
        ] {
            let engine = registry.resolve(algorithm).unwrap();
            assert_eq!(engine.algorithm(), algorithm);
        }
    }

    #[test]
    fn test_resolve_fails_on_empty_registry() {
        let registry = LimiterRegistry::new();
        assert!(registry.is_empty());
        let err = registry.resolve(Algorithm::TokenBucket).unwrap_err();
        assert!(matches!(err, RateLimitError::UnsupportedAlgorithm(_)));
    }
}
