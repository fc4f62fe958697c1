//! Admission control boundary
//!
//! [`AdmissionControl`] is the one entry point callers use: it validates
//! the policy, derives the rate limit key from the request context,
//! resolves the engine and turns a denial into
//! [`RateLimitError::Exceeded`]. Store outages are handled per the
//! configured [`FailurePolicy`].

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::context::{derive_key, RequestContext};
use crate::config::{RateLimitPolicy, Validate};
use crate::limiter::{LimiterRegistry, RateLimitError};

/// What to do when the counter store is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Admit the request and log a warning. Prefers availability: an
    /// outage of the store must not take the protected service down.
    #[default]
    FailOpen,
    /// Propagate the store error to the caller
    FailClosed,
}

/// Policy-driven admission control over a registry of engines
pub struct AdmissionControl {
    registry: Arc<LimiterRegistry>,
    failure_policy: FailurePolicy,
}

impl AdmissionControl {
    pub fn new(registry: Arc<LimiterRegistry>) -> Self {
        Self {
            registry,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Admit or reject one request under the given policy.
    /// Returns `Ok(())` when the request may proceed.
    pub async fn admit(
        &self,
        ctx: &RequestContext,
        policy: &RateLimitPolicy,
    ) -> Result<(), RateLimitError> {
        policy.validate()?;

        let key = derive_key(ctx, policy.key_type);
        let engine = self.registry.resolve(policy.algorithm)?;

        match engine.try_acquire(&key, policy.limit, policy.period()).await {
            Ok(true) => {
                debug!(
                    operation = %ctx.operation(),
                    key = %key,
                    algorithm = %policy.algorithm,
                    "Request admitted"
                );
                Ok(())
            }
            Ok(false) => Err(RateLimitError::Exceeded {
                limit: policy.limit,
                period_secs: policy.period_secs,
                algorithm: policy.algorithm,
            }),
            Err(err @ RateLimitError::StoreUnavailable(_))
                if self.failure_policy == FailurePolicy::FailOpen =>
            {
                warn!(
                    operation = %ctx.operation(),
                    key = %key,
                    error = %err,
                    "Counter store unavailable, admitting request"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Run `op` iff the request is admitted
    pub async fn guard<F, Fut, T>(
        &self,
        ctx: &RequestContext,
        policy: &RateLimitPolicy,
        op: F,
    ) -> Result<T, RateLimitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.admit(ctx, policy).await?;
        Ok(op().await)
    }
}
