//! LLM error types

use sotto_core::ErrorKind;
use sotto_plugins::PluginError;
use thiserror::Error;

/// Provider-level failures, folded into [`PluginError`] at the plugin boundary
#[derive(Error, Debug)]
pub enum LlmError {
    /// API key not configured
    #[error("API key not configured (set {0})")]
    ApiKeyMissing(&'static str),

    /// Non-success HTTP status
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Body did not have the expected shape
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out")]
    Timeout,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::ApiKeyMissing(_) => ErrorKind::StateFailure,
            LlmError::InvalidResponse(_) => ErrorKind::StructuralFailure,
            LlmError::ModelNotAvailable(_) => ErrorKind::NotFound,
            LlmError::RequestFailed(_)
            | LlmError::RateLimited(_)
            | LlmError::ConnectionError(_)
            | LlmError::Timeout => ErrorKind::TransportFailure,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::ConnectionError(err.to_string())
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

impl From<LlmError> for PluginError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ConnectionError(_) | LlmError::ApiKeyMissing(_) => {
                PluginError::Unavailable(err.to_string())
            }
            LlmError::Timeout => PluginError::Timeout(err.to_string()),
            other => PluginError::Generation(other.to_string()),
        }
    }
}
