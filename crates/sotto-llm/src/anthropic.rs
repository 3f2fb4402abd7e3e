//! Anthropic Messages API plugin

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sotto_plugins::{parse_options, Lifecycle, LlmPlugin, LlmRequest, LlmResponse, Plugin, PluginError};
use tracing::{debug, info, warn};

use crate::error::LlmError;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Environment variable the API key is read from
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Options accepted by [`AnthropicLlm::update_options`]
///
/// `api_key`, when present, replaces the stored key and is not kept in the options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicOptions {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for AnthropicOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            api_key: None,
        }
    }
}

struct Settings {
    options: AnthropicOptions,
    api_key: Option<SecretString>,
}

/// Claude models through the Anthropic Messages API
pub struct AnthropicLlm {
    lifecycle: Lifecycle,
    client: Client,
    settings: RwLock<Settings>,
}

impl AnthropicLlm {
    pub const ID: &'static str = "anthropic";

    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            client: crate::http_client(),
            settings: RwLock::new(Settings {
                options: AnthropicOptions::default(),
                api_key,
            }),
        }
    }

    /// Key taken from `ANTHROPIC_API_KEY`, if set and non-empty
    pub fn from_env() -> Self {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::new);
        Self::new(key)
    }

    pub fn options(&self) -> AnthropicOptions {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .options
            .clone()
    }

    pub fn has_api_key(&self) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api_key
            .is_some()
    }

    /// Options plus a request builder carrying the auth headers
    fn request(&self, build: impl FnOnce(&Client, &str) -> RequestBuilder) -> Result<(AnthropicOptions, RequestBuilder), LlmError> {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        let key = settings
            .api_key
            .as_ref()
            .ok_or(LlmError::ApiKeyMissing(API_KEY_ENV))?;
        let base = settings.options.base_url.trim_end_matches('/');
        let builder = build(&self.client, base)
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", API_VERSION);
        Ok((settings.options.clone(), builder))
    }

    async fn send_message(&self, prompt: &str) -> Result<String, LlmError> {
        let (options, builder) =
            self.request(|client, base| client.post(format!("{}/v1/messages", base)))?;

        let request = MessagesRequest {
            model: &options.model,
            max_tokens: options.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending request to Anthropic (model: {})", options.model);

        let response = builder.json(&request).send().await?;
        let response = check_status(response).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        first_text(body)
    }

    async fn models(&self) -> Result<Vec<String>, LlmError> {
        let (_, builder) = self.request(|client, base| client.get(format!("{}/v1/models", base)))?;
        let response = check_status(builder.send().await?).await?;

        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(body.data.into_iter().map(|m| m.id).collect())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(LlmError::RateLimited(retry_after));
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!("Anthropic API error: {} - {}", status, error_text);
        return Err(LlmError::RequestFailed(format!("{}: {}", status, error_text)));
    }

    Ok(response)
}

fn first_text(body: MessagesResponse) -> Result<String, LlmError> {
    body.content
        .into_iter()
        .find_map(|block| block.text)
        .ok_or_else(|| LlmError::InvalidResponse("Empty response".to_string()))
}

impl Plugin for AnthropicLlm {
    fn id(&self) -> &str {
        Self::ID
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn update_options(&self, options: serde_json::Value) -> Result<(), PluginError> {
        let mut parsed: AnthropicOptions = parse_options(Self::ID, options)?;
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(key) = parsed.api_key.take() {
            settings.api_key = Some(SecretString::new(key));
        }
        info!("Anthropic options updated (model: {})", parsed.model);
        settings.options = parsed;
        Ok(())
    }

    /// Refuses to enable without a key so activation fails early
    fn on_enable(&self) -> Result<(), PluginError> {
        if !self.has_api_key() {
            return Err(LlmError::ApiKeyMissing(API_KEY_ENV).into());
        }
        Ok(())
    }
}

#[async_trait]
impl LlmPlugin for AnthropicLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, PluginError> {
        let text = self.send_message(&request.text).await?;
        Ok(LlmResponse { text })
    }

    async fn list_models(&self) -> Result<Vec<String>, PluginError> {
        Ok(self.models().await?)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    id: String,
}
