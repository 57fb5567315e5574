//! # Embeddings Provider
//!
//! This module provides functionality for generating vector embeddings by calling
//! an external embeddings API. Two wire formats are understood:
//!
//! - Ollama's native `/api/embed` endpoint (`{model, input}` → `{embeddings: [[..]]}`).
//! - Any OpenAI-compatible `/embeddings` endpoint (`{model, input}` → `{data: [{embedding}]}`).
//!
//! Embedding requests carry no sampling parameters.

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::time::Duration;
use tracing::debug;

/// A trait for turning text into vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug + DynClone {
    /// Generates one embedding vector for `input`.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PromptError>;
}

dyn_clone::clone_trait_object!(EmbeddingProvider);

// --- Request and response structures ---

#[derive(Serialize, Debug)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

/// The wire format spoken by an embeddings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingApi {
    Ollama,
    OpenAi,
}

impl EmbeddingApi {
    /// Infers the wire format from the endpoint URL.
    pub fn detect(api_url: &str) -> Self {
        if api_url.trim_end_matches('/').ends_with("/api/embed") {
            EmbeddingApi::Ollama
        } else {
            EmbeddingApi::OpenAi
        }
    }
}

/// An `EmbeddingProvider` backed by an HTTP embeddings service.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    client: ReqwestClient,
    api_url: String,
    model: String,
    api_key: Option<String>,
    api: EmbeddingApi,
}

impl Debug for HttpEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbeddingProvider")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl HttpEmbeddingProvider {
    pub fn new(
        api_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PromptError> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(PromptError::ReqwestClientBuild)?;
        let api = EmbeddingApi::detect(&api_url);
        Ok(Self {
            client,
            api_url,
            model,
            api_key,
            api,
        })
    }

    pub fn api(&self) -> EmbeddingApi {
        self.api
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PromptError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input,
        };
        debug!(api = ?self.api, chars = input.chars().count(), "--> Sending request to embeddings API");

        let mut request_builder = self.client.post(&self.api_url).json(&request_body);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(format!("{status}: {error_text}")));
        }

        let vector = match self.api {
            EmbeddingApi::Ollama => {
                let body: OllamaEmbeddingResponse = response
                    .json()
                    .await
                    .map_err(PromptError::AiDeserialization)?;
                body.embeddings.into_iter().next()
            }
            EmbeddingApi::OpenAi => {
                let body: OpenAIEmbeddingResponse = response
                    .json()
                    .await
                    .map_err(PromptError::AiDeserialization)?;
                body.data.into_iter().next().map(|d| d.embedding)
            }
        };

        vector.ok_or_else(|| PromptError::AiApi("Embeddings API returned no embeddings".to_string()))
    }
}
