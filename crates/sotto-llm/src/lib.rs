//! LLM provider plugins for sotto
//!
//! Each provider implements [`sotto_plugins::LlmPlugin`] and is registered
//! like any other plugin; the director uses whichever one is active.

pub mod error;
#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use error::LlmError;
#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicLlm, AnthropicOptions, API_KEY_ENV};
#[cfg(feature = "ollama")]
pub use ollama::{OllamaLlm, OllamaOptions};

use std::time::Duration;

/// Connection setup bound shared by the HTTP providers
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}
