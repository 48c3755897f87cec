//! Error types shared across the recommendation pipeline
//!
//! Provider errors never cross the gateway boundary; they are logged and
//! turned into fallback values there. Cache errors degrade to "compute,
//! don't cache". Only `Stage` can reach the progressive emitter.

use std::time::Duration;
use thiserror::Error;

/// Pipeline error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// A provider did not answer within its call timeout
    #[error("provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// Network failure, bad status, or any other provider-level failure
    #[error("provider call failed: {0}")]
    ProviderFailure(String),

    /// A provider answered with a payload that could not be parsed
    #[error("malformed provider payload: {0}")]
    Aggregation(String),

    /// The response cache backend could not be reached
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A pipeline stage task ended abnormally
    #[error("stage failed: {0}")]
    Stage(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report the configured duration
            Error::ProviderTimeout(Duration::ZERO)
        } else if err.is_decode() {
            Error::Aggregation(err.to_string())
        } else {
            Error::ProviderFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Aggregation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Stage(err.to_string())
    }
}
