//! Configuration management
//!
//! Layered configuration: built-in defaults, then an optional
//! `config/default` file, then environment variables with the `GATELIMIT`
//! prefix and `__` as the nesting separator
//! (e.g. `GATELIMIT__STORAGE__URL=redis://cache:6379`).

pub mod validation;

pub use validation::{Validate, ValidationError};

use crate::limiter::types::Algorithm;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limiter: LimiterConfig,
    /// Default policy applied when an operation does not declare its own
    #[serde(default)]
    pub policy: RateLimitPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which counter store backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Redis,
    Memory,
}

/// Counter store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Connection URL, used by the Redis backend
    #[serde(default = "default_storage_url")]
    pub url: String,
}

fn default_storage_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: default_storage_url(),
        }
    }
}

/// Engine-level settings shared by all policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Prefix for every counter key in the store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Bucket size for the sliding window counter algorithm
    #[serde(default = "default_bucket_secs")]
    pub sliding_window_bucket_secs: u64,
    /// TTL for token and leaky bucket state after the last request
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_key_prefix() -> String {
    "ratelimit".to_string()
}

fn default_bucket_secs() -> u64 {
    60
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            sliding_window_bucket_secs: default_bucket_secs(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

/// How a limited client is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Client IP address, resolved through proxy headers
    #[default]
    Ip,
    /// Authenticated principal; anonymous requests share one key
    User,
    /// The operation name itself, one global limit for everyone
    Method,
}

/// A rate limit policy for one operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum number of requests per period
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Period length in seconds
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    #[serde(default)]
    pub key_type: KeyType,
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
}

fn default_limit() -> u64 {
    10
}

fn default_period_secs() -> u64 {
    60
}

fn default_algorithm() -> Algorithm {
    Algorithm::SlidingWindowCounter
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            period_secs: default_period_secs(),
            key_type: KeyType::default(),
            algorithm: default_algorithm(),
        }
    }
}

impl RateLimitPolicy {
    pub fn new(limit: u64, period_secs: u64) -> Self {
        Self {
            limit,
            period_secs,
            ..Self::default()
        }
    }

    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigLoadError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("GATELIMIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::Redis
            && !self.url.starts_with("redis://")
            && !self.url.starts_with("rediss://")
        {
            return Err(ValidationError::storage(format!(
                "url must start with redis:// or rediss://, got '{}'",
                self.url
            )));
        }
        Ok(())
    }
}

impl Validate for LimiterConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.key_prefix.is_empty() {
            return Err(ValidationError::limiter("key_prefix must not be empty"));
        }
        if self.sliding_window_bucket_secs == 0 {
            return Err(ValidationError::limiter(
                "sliding_window_bucket_secs must be greater than zero",
            ));
        }
        if self.idle_ttl_secs == 0 {
            return Err(ValidationError::limiter(
                "idle_ttl_secs must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Validate for RateLimitPolicy {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 {
            return Err(ValidationError::policy("limit must be greater than zero"));
        }
        if self.period_secs == 0 {
            return Err(ValidationError::policy(
                "period_secs must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.storage.validate()?;
        self.limiter.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}
