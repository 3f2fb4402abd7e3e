//! Ollama local LLM plugin

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sotto_plugins::{parse_options, Lifecycle, LlmPlugin, LlmRequest, LlmResponse, Plugin, PluginError};
use tracing::{debug, info, warn};

use crate::error::LlmError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Options accepted by [`OllamaLlm::update_options`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaOptions {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for OllamaOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            num_predict: 4096,
        }
    }
}

/// Talks to a local Ollama server over its HTTP API
pub struct OllamaLlm {
    lifecycle: Lifecycle,
    client: Client,
    options: RwLock<OllamaOptions>,
}

impl OllamaLlm {
    pub const ID: &'static str = "ollama";

    pub fn new() -> Self {
        Self::with_options(OllamaOptions::default())
    }

    pub fn with_options(options: OllamaOptions) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            client: crate::http_client(),
            options: RwLock::new(options),
        }
    }

    pub fn options(&self) -> OllamaOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn base_url(options: &OllamaOptions) -> &str {
        options.base_url.trim_end_matches('/')
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let options = self.options();
        let url = format!("{}/api/generate", Self::base_url(&options));

        let request = GenerateRequest {
            model: &options.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.num_predict,
            },
        };

        debug!("Sending request to Ollama at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::ConnectionError(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        options.base_url
                    ))
                } else {
                    LlmError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Ollama API error: {} - {}", status, error_text);

            if error_text.contains("model") && error_text.contains("not found") {
                return Err(LlmError::ModelNotAvailable(options.model));
            }
            return Err(LlmError::RequestFailed(format!("{}: {}", status, error_text)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(body.response)
    }

    async fn tags(&self) -> Result<Vec<String>, LlmError> {
        let options = self.options();
        let url = format!("{}/api/tags", Self::base_url(&options));

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LlmError::RequestFailed(format!(
                "Failed to list models: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

impl Default for OllamaLlm {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for OllamaLlm {
    fn id(&self) -> &str {
        Self::ID
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn update_options(&self, options: serde_json::Value) -> Result<(), PluginError> {
        let parsed: OllamaOptions = parse_options(Self::ID, options)?;
        info!("Ollama options updated (model: {}, url: {})", parsed.model, parsed.base_url);
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = parsed;
        Ok(())
    }
}

#[async_trait]
impl LlmPlugin for OllamaLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, PluginError> {
        let text = self.complete(&request.text).await?;
        Ok(LlmResponse { text })
    }

    async fn list_models(&self) -> Result<Vec<String>, PluginError> {
        Ok(self.tags().await?)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagsModel>,
}

#[derive(Deserialize)]
struct TagsModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let plugin = OllamaLlm::new();
        let options = plugin.options();
        assert_eq!(options.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(options.model, DEFAULT_MODEL);
        assert_eq!(plugin.id(), "ollama");
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let plugin = OllamaLlm::new();
        plugin
            .update_options(json!({ "model": "mistral" }))
            .unwrap();
        let options = plugin.options();
        assert_eq!(options.model, "mistral");
        assert_eq!(options.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_bad_options_rejected() {
        let plugin = OllamaLlm::new();
        let err = plugin
            .update_options(json!({ "temperature": "warm" }))
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidOptions { .. }));
        assert_eq!(plugin.options(), OllamaOptions::default());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                temperature: 0.5,
                num_predict: 16,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["options"]["num_predict"], json!(16));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let options = OllamaOptions {
            base_url: "http://host:1/".into(),
            ..Default::default()
        };
        assert_eq!(OllamaLlm::base_url(&options), "http://host:1");
    }
}
