//! `sotto polish ...`
//!
//! Runs text through the same prompt and LLM plugins the director uses.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde_json::json;
use sotto_core::settings::keys;
use sotto_core::SettingsStore;
use sotto_llm::{AnthropicLlm, OllamaLlm, OllamaOptions};
use sotto_plugins::{
    build_polishing_prompt, DirectorOptions, LlmPlugin, LlmRequest, PluginCategory, PluginHandle,
    PluginRegistry,
};
use tracing::info;

use crate::cli::{PolishArgs, ProviderArg};

pub async fn run(args: PolishArgs, settings: &dyn SettingsStore) -> Result<()> {
    let provider = resolve_provider(args.provider, settings);
    let model = args
        .model
        .clone()
        .or_else(|| non_empty(settings.get_string(keys::LLM_MODEL, "")));
    let base_url = args
        .base_url
        .clone()
        .or_else(|| non_empty(settings.get_string(keys::LLM_BASE_URL, "")));

    let mut registry = PluginRegistry::new();
    let (handle, options) = match provider {
        ProviderArg::Ollama => {
            let defaults = OllamaOptions::default();
            let options = OllamaOptions {
                base_url: base_url.unwrap_or(defaults.base_url),
                model: model.unwrap_or(defaults.model),
                ..defaults
            };
            (
                PluginHandle::Llm(Arc::new(OllamaLlm::new())),
                serde_json::to_value(options)?,
            )
        }
        ProviderArg::Anthropic => {
            let plugin = match args.api_key.clone() {
                Some(key) => AnthropicLlm::new(Some(SecretString::new(key))),
                None => AnthropicLlm::from_env(),
            };
            let mut options = json!({});
            if let Some(model) = model {
                options["model"] = json!(model);
            }
            if let Some(base_url) = base_url {
                options["base_url"] = json!(base_url);
            }
            (PluginHandle::Llm(Arc::new(plugin)), options)
        }
    };

    let id = handle.id().to_string();
    registry.register(handle)?;
    registry.update_options(PluginCategory::Llm, &id, options)?;
    registry
        .set_active_by_id(PluginCategory::Llm, &id)
        .with_context(|| format!("Failed to activate {}", id))?;
    let llm = registry
        .active_llm()
        .ok_or_else(|| anyhow!("No active LLM plugin"))?;

    let text = args.text.join(" ");
    let prompt = if args.raw {
        text
    } else {
        let director = DirectorOptions::from_settings(settings);
        let language = match &args.language {
            Some(code) => sotto_core::Language::from_iso2(code)
                .ok_or_else(|| anyhow!("Unsupported language: {}", code))?,
            None => director.language(),
        };
        build_polishing_prompt(
            &text,
            &language,
            &director.custom_context,
            &director.custom_vocabulary,
        )
    };

    info!("Polishing with {}", id);
    let result = llm.generate(LlmRequest { text: prompt }).await;
    registry.shutdown_all();

    let response = result.with_context(|| format!("{} request failed", id))?;
    println!("{}", response.text.trim());
    Ok(())
}

/// Flag, then `llm.provider` setting, then Ollama
fn resolve_provider(flag: Option<ProviderArg>, settings: &dyn SettingsStore) -> ProviderArg {
    flag.or_else(|| ProviderArg::from_setting(&settings.get_string(keys::LLM_PROVIDER, "")))
        .unwrap_or(ProviderArg::Ollama)
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
