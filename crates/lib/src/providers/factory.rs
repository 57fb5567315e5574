//! # AI Provider Factory
//!
//! This module centralizes the logic for turning configuration entries into AI
//! provider instances. By placing it in the `lib` crate, every consumer builds
//! providers the same way.

use crate::{
    constants::MISSING_API_KEY_PLACEHOLDER,
    errors::PromptError,
    providers::ai::{AiProvider, EmbeddingProvider, HttpEmbeddingProvider, OpenAiCompatibleProvider},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// The default chat completions endpoint for Groq.
pub const GROQ_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// The default local Ollama embeddings endpoint.
pub const OLLAMA_EMBED_URL: &str = "http://localhost:11434/api/embed";

/// A reusable configuration for a chat provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider: `"groq"`, `"openai"` or `"local"`.
    pub provider: String,
    /// The API URL. Optional for Groq, where the public endpoint is used.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Configuration for the embedding model provider.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Builds a chat provider from its configuration entry.
pub fn build_ai_provider(
    name: &str,
    config: &ProviderConfig,
    timeout: Option<Duration>,
) -> Result<Box<dyn AiProvider>, PromptError> {
    let api_key = non_empty(&config.api_key);
    let (api_url, api_key) = match config.provider.as_str() {
        "groq" | "openai" => {
            let api_url = match (non_empty(&config.api_url), config.provider.as_str()) {
                (Some(url), _) => url,
                (None, "groq") => GROQ_CHAT_COMPLETIONS_URL.to_string(),
                (None, _) => {
                    return Err(PromptError::AiApi(format!(
                        "api_url is required for provider '{name}'"
                    )))
                }
            };
            let api_key = api_key.unwrap_or_else(|| {
                warn!(
                    "No api_key configured for provider '{name}'. Requests will be rejected until one is set."
                );
                MISSING_API_KEY_PLACEHOLDER.to_string()
            });
            (api_url, Some(api_key))
        }
        "local" => {
            let api_url = non_empty(&config.api_url).ok_or_else(|| {
                PromptError::AiApi(format!("api_url is required for local provider '{name}'"))
            })?;
            (api_url, api_key)
        }
        other => {
            return Err(PromptError::AiApi(format!(
                "Unsupported AI provider type '{other}' for provider '{name}'"
            )))
        }
    };

    info!(provider = %name, %api_url, model = %config.model_name, "Configured chat provider.");
    let provider = OpenAiCompatibleProvider::with_timeout(
        api_url,
        api_key,
        Some(config.model_name.clone()),
        timeout,
    )?
    .temperature(config.temperature)
    .max_tokens(config.max_tokens);

    Ok(Box::new(provider))
}

/// Builds the embedding provider used by the indexing stage.
pub fn build_embedding_provider(
    config: &EmbeddingConfig,
    timeout: Option<Duration>,
) -> Result<Box<dyn EmbeddingProvider>, PromptError> {
    let provider = HttpEmbeddingProvider::new(
        config.api_url.clone(),
        config.model_name.clone(),
        non_empty(&config.api_key),
        timeout,
    )?;
    info!(api_url = %config.api_url, model = %config.model_name, api = ?provider.api(), "Configured embedding provider.");
    Ok(Box::new(provider))
}
