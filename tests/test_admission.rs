//! Integration tests for admission control and the rate limiting engines
//!
//! Everything runs against the in-memory store except the Redis suite at
//! the bottom, which needs Docker and is ignored by default.

use gatelimit::{
    derive_key, AdmissionControl, Algorithm, CounterStore, FailurePolicy, InMemoryCounterStore,
    KeyType, LimiterConfig, LimiterRegistry, RateLimitError, RateLimitPolicy, RateLimiter,
    RequestContext,
};
use std::sync::Arc;
use std::time::Duration;

fn memory_registry() -> Arc<LimiterRegistry> {
    let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
    Arc::new(LimiterRegistry::all(store, &LimiterConfig::default()))
}

fn admission_control() -> AdmissionControl {
    AdmissionControl::new(memory_registry())
}

fn ip_context(addr: &str) -> RequestContext {
    RequestContext::new("test.op").with_remote_addr(addr)
}

mod fixed_window_tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_is_enforced_within_one_window() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.1");
        let policy = RateLimitPolicy::new(3, 60).with_algorithm(Algorithm::FixedWindow);

        for _ in 0..3 {
            assert!(control.admit(&ctx, &policy).await.is_ok());
        }
        assert!(matches!(
            control.admit(&ctx, &policy).await,
            Err(RateLimitError::Exceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_count_resets_at_the_window_boundary() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.2");
        let policy = RateLimitPolicy::new(2, 1).with_algorithm(Algorithm::FixedWindow);

        assert!(control.admit(&ctx, &policy).await.is_ok());
        assert!(control.admit(&ctx, &policy).await.is_ok());
        assert!(control.admit(&ctx, &policy).await.is_err());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(control.admit(&ctx, &policy).await.is_ok());
    }
}

mod sliding_window_log_tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_is_enforced_over_the_trailing_period() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.3");
        let policy = RateLimitPolicy::new(4, 60).with_algorithm(Algorithm::SlidingWindowLog);

        for _ in 0..4 {
            assert!(control.admit(&ctx, &policy).await.is_ok());
        }
        assert!(control.admit(&ctx, &policy).await.is_err());
    }

    #[tokio::test]
    async fn test_denials_do_not_delay_recovery() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.4");
        let policy = RateLimitPolicy::new(1, 1).with_algorithm(Algorithm::SlidingWindowLog);

        assert!(control.admit(&ctx, &policy).await.is_ok());
        for _ in 0..5 {
            assert!(control.admit(&ctx, &policy).await.is_err());
        }

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(control.admit(&ctx, &policy).await.is_ok());
    }
}

mod sliding_window_counter_tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_is_enforced_within_the_bucket() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.5");
        let policy = RateLimitPolicy::new(5, 60).with_algorithm(Algorithm::SlidingWindowCounter);

        for _ in 0..5 {
            assert!(control.admit(&ctx, &policy).await.is_ok());
        }
        assert!(control.admit(&ctx, &policy).await.is_err());
    }

    #[tokio::test]
    async fn test_small_bucket_frees_capacity_over_time() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let limiter = gatelimit::limiter::SlidingWindowCounterLimiter::new(
            store,
            "test",
            Duration::from_millis(500),
        );

        assert!(limiter
            .try_acquire("client", 2, Duration::from_secs(60))
            .await
            .unwrap());
        assert!(limiter
            .try_acquire("client", 2, Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!limiter
            .try_acquire("client", 2, Duration::from_secs(60))
            .await
            .unwrap());

        // After two full buckets both rows have aged out of the blend
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter
            .try_acquire("client", 2, Duration::from_secs(60))
            .await
            .unwrap());
    }
}

mod token_bucket_tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_steady_refill() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.6");
        let policy = RateLimitPolicy::new(5, 1).with_algorithm(Algorithm::TokenBucket);

        for _ in 0..5 {
            assert!(control.admit(&ctx, &policy).await.is_ok());
        }
        assert!(control.admit(&ctx, &policy).await.is_err());

        // 5 tokens per second; 300ms buys exactly one more admission
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(control.admit(&ctx, &policy).await.is_ok());
        assert!(control.admit(&ctx, &policy).await.is_err());
    }
}

mod leaky_bucket_tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_fills_queue_then_drains_at_rate() {
        let control = admission_control();
        let ctx = ip_context("192.0.2.7");
        let policy = RateLimitPolicy::new(5, 1).with_algorithm(Algorithm::LeakyBucket);

        for _ in 0..5 {
            assert!(control.admit(&ctx, &policy).await.is_ok());
        }
        assert!(control.admit(&ctx, &policy).await.is_err());

        // 5 drained per second; 300ms frees exactly one slot
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(control.admit(&ctx, &policy).await.is_ok());
        assert!(control.admit(&ctx, &policy).await.is_err());
    }
}

mod key_derivation_tests {
    use super::*;

    #[tokio::test]
    async fn test_different_ips_get_independent_budgets() {
        let control = admission_control();
        let policy = RateLimitPolicy::new(1, 60).with_algorithm(Algorithm::TokenBucket);

        let a = ip_context("192.0.2.10");
        let b = ip_context("192.0.2.11");

        assert!(control.admit(&a, &policy).await.is_ok());
        assert!(control.admit(&a, &policy).await.is_err());
        assert!(control.admit(&b, &policy).await.is_ok());
    }

    #[tokio::test]
    async fn test_method_keyed_budget_is_shared_across_clients() {
        let control = admission_control();
        let policy = RateLimitPolicy::new(1, 60)
            .with_key_type(KeyType::Method)
            .with_algorithm(Algorithm::TokenBucket);

        let a = ip_context("192.0.2.10");
        let b = ip_context("192.0.2.11");

        assert!(control.admit(&a, &policy).await.is_ok());
        assert!(control.admit(&b, &policy).await.is_err());
    }

    #[tokio::test]
    async fn test_proxy_chain_resolution_feeds_the_key() {
        let ctx = RequestContext::new("op")
            .with_header("X-Forwarded-For", "unknown, 10.0.0.1")
            .with_header("Proxy-Client-IP", "203.0.113.50")
            .with_remote_addr("10.0.0.9");
        assert_eq!(derive_key(&ctx, KeyType::Ip), "203.0.113.50");
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_requests_never_exceed_the_limit() {
        let registry = memory_registry();
        let control = Arc::new(AdmissionControl::new(registry));

        // 50 concurrent calls on a fresh key with limit 10 admit exactly
        // 10, for every algorithm. Engines namespace their keys, so each
        // algorithm sees a fresh budget for the same address.
        for algorithm in [
            Algorithm::FixedWindow,
            Algorithm::SlidingWindowLog,
            Algorithm::SlidingWindowCounter,
            Algorithm::TokenBucket,
            Algorithm::LeakyBucket,
        ] {
            let policy = RateLimitPolicy::new(10, 60).with_algorithm(algorithm);

            let mut handles = Vec::new();
            for _ in 0..50 {
                let control = control.clone();
                handles.push(tokio::spawn(async move {
                    let ctx = ip_context("192.0.2.20");
                    control.admit(&ctx, &policy).await.is_ok()
                }));
            }

            let mut admitted = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    admitted += 1;
                }
            }
            assert_eq!(admitted, 10, "{algorithm} admitted a wrong count");
        }
    }
}

mod failure_policy_tests {
    use super::*;
    use async_trait::async_trait;
    use gatelimit::StoreError;

    /// Store whose every call fails as if the backend were down
    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn incr_fixed_window(&self, _: &str, _: u64) -> Result<u64, StoreError> {
            Err(StoreError::Malformed("backend offline".to_string()))
        }
        async fn acquire_log_slot(&self, _: &str, _: u64, _: u64, _: u64) -> Result<bool, StoreError> {
            Err(StoreError::Malformed("backend offline".to_string()))
        }
        async fn acquire_weighted_slot(
            &self,
            _: &str,
            _: u64,
            _: u64,
            _: u64,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Malformed("backend offline".to_string()))
        }
        async fn acquire_token(
            &self,
            _: &str,
            _: u64,
            _: u64,
            _: f64,
            _: u64,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Malformed("backend offline".to_string()))
        }
        async fn acquire_queue_slot(
            &self,
            _: &str,
            _: u64,
            _: u64,
            _: f64,
            _: u64,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Malformed("backend offline".to_string()))
        }
    }

    fn broken_registry() -> Arc<LimiterRegistry> {
        let store: Arc<dyn CounterStore> = Arc::new(BrokenStore);
        Arc::new(LimiterRegistry::all(store, &LimiterConfig::default()))
    }

    #[tokio::test]
    async fn test_fail_open_admits_when_the_store_is_down() {
        let control = AdmissionControl::new(broken_registry());
        let ctx = ip_context("192.0.2.30");
        let policy = RateLimitPolicy::new(1, 60).with_algorithm(Algorithm::TokenBucket);

        assert!(control.admit(&ctx, &policy).await.is_ok());
        assert!(control.admit(&ctx, &policy).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_closed_propagates_the_store_error() {
        let control = AdmissionControl::new(broken_registry())
            .with_failure_policy(FailurePolicy::FailClosed);
        let ctx = ip_context("192.0.2.31");
        let policy = RateLimitPolicy::new(1, 60).with_algorithm(Algorithm::TokenBucket);

        let err = control.admit(&ctx, &policy).await.unwrap_err();
        assert!(matches!(err, RateLimitError::StoreUnavailable(_)));
        assert_eq!(err.status_code(), 503);
    }
}

mod redis_integration_tests {
    use super::*;
    use gatelimit::RedisCounterStore;
    use testcontainers::core::{IntoContainerPort, WaitFor};
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage};

    async fn start_redis() -> (ContainerAsync<GenericImage>, String) {
        let container = GenericImage::new("redis", "7-alpine")
            .with_exposed_port(6379.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await
            .expect("failed to start Redis container");
        let host = container.get_host().await.expect("container host");
        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("container port");
        let url = format!("redis://{}:{}", host, port);
        (container, url)
    }

    #[tokio::test]
    #[ignore = "requires Docker for Redis container"]
    async fn test_every_algorithm_enforces_its_limit_against_redis() {
        let (_container, url) = start_redis().await;
        let store: Arc<dyn CounterStore> =
            Arc::new(RedisCounterStore::new(&url).await.expect("connect"));
        let registry = Arc::new(LimiterRegistry::all(store, &LimiterConfig::default()));
        let control = AdmissionControl::new(registry);

        for algorithm in [
            Algorithm::FixedWindow,
            Algorithm::SlidingWindowLog,
            Algorithm::SlidingWindowCounter,
            Algorithm::TokenBucket,
            Algorithm::LeakyBucket,
        ] {
            let ctx = ip_context("192.0.2.40");
            let policy = RateLimitPolicy::new(3, 60).with_algorithm(algorithm);

            for _ in 0..3 {
                assert!(
                    control.admit(&ctx, &policy).await.is_ok(),
                    "{algorithm} denied under the limit"
                );
            }
            assert!(
                control.admit(&ctx, &policy).await.is_err(),
                "{algorithm} admitted over the limit"
            );
        }
    }

    #[tokio::test]
    #[ignore = "requires Docker for Redis container"]
    async fn test_two_stores_share_one_budget() {
        let (_container, url) = start_redis().await;
        let store_a: Arc<dyn CounterStore> =
            Arc::new(RedisCounterStore::new(&url).await.expect("connect"));
        let store_b: Arc<dyn CounterStore> =
            Arc::new(RedisCounterStore::new(&url).await.expect("connect"));

        let config = LimiterConfig::default();
        let control_a = AdmissionControl::new(Arc::new(LimiterRegistry::all(store_a, &config)));
        let control_b = AdmissionControl::new(Arc::new(LimiterRegistry::all(store_b, &config)));

        let ctx = ip_context("192.0.2.41");
        let policy = RateLimitPolicy::new(2, 60).with_algorithm(Algorithm::TokenBucket);

        assert!(control_a.admit(&ctx, &policy).await.is_ok());
        assert!(control_b.admit(&ctx, &policy).await.is_ok());
        // Budget exhausted globally, both instances deny
        assert!(control_a.admit(&ctx, &policy).await.is_err());
        assert!(control_b.admit(&ctx, &policy).await.is_err());
    }
}
