//! Configuration validation

use thiserror::Error;

/// Validation errors for configuration and policies
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid storage configuration: {message}")]
    Storage { message: String },

    #[error("Invalid limiter configuration: {message}")]
    Limiter { message: String },

    #[error("Invalid rate limit policy: {message}")]
    Policy { message: String },
}

impl ValidationError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn limiter(message: impl Into<String>) -> Self {
        Self::Limiter {
            message: message.into(),
        }
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy {
            message: message.into(),
        }
    }
}

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}
