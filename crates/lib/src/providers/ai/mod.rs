pub mod embedding;
pub mod openai;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use openai::OpenAiCompatibleProvider;
use std::fmt::Debug;

/// A trait for interacting with a chat-capable AI provider.
///
/// The summarization pipeline only needs one operation: send a system and a user
/// prompt, get back the model's text.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
