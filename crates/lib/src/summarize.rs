//! # Conversation Summarization
//!
//! Renders the summary prompt with a conversation transcript, sends it to a chat
//! provider, and hands back the model's raw text. The pipeline never fails: any
//! error, including an empty reply, collapses to [`SUMMARY_FALLBACK`].

use crate::{
    prompts::{
        render,
        summary::{CONVERSATION_SUMMARY_SYSTEM_PROMPT, CONVERSATION_SUMMARY_USER_PROMPT},
    },
    providers::ai::AiProvider,
    PromptError,
};
use tracing::{error, info};

/// Returned in place of a summary whenever generation fails.
pub const SUMMARY_FALLBACK: &str = "Unable to generate conversation summary due to an error.";

/// The prompt pair used by [`summarize_conversation`].
#[derive(Debug, Clone, Copy)]
pub struct SummaryPrompts<'a> {
    pub system_prompt: &'a str,
    /// Must contain the `{conversation}` placeholder.
    pub user_prompt_template: &'a str,
}

impl Default for SummaryPrompts<'static> {
    fn default() -> Self {
        Self {
            system_prompt: CONVERSATION_SUMMARY_SYSTEM_PROMPT,
            user_prompt_template: CONVERSATION_SUMMARY_USER_PROMPT,
        }
    }
}

impl SummaryPrompts<'_> {
    /// Renders the user prompt with the transcript embedded verbatim.
    pub fn render_user_prompt(&self, conversation_history: &str) -> String {
        render(
            self.user_prompt_template,
            &[("conversation", conversation_history)],
        )
    }
}

async fn try_summarize(
    ai_provider: &dyn AiProvider,
    prompts: SummaryPrompts<'_>,
    conversation_history: &str,
) -> Result<String, PromptError> {
    let user_prompt = prompts.render_user_prompt(conversation_history);
    let summary = ai_provider
        .generate(prompts.system_prompt, &user_prompt)
        .await?;

    if summary.trim().is_empty() {
        return Err(PromptError::AiApi("model returned an empty summary".to_string()));
    }
    Ok(summary)
}

/// Summarizes a full user/bot conversation.
///
/// `user_email` is only used for logging.
pub async fn summarize_conversation(
    ai_provider: &dyn AiProvider,
    prompts: SummaryPrompts<'_>,
    conversation_history: &str,
    user_email: &str,
) -> String {
    info!("Executing summary chain for {user_email}...");
    match try_summarize(ai_provider, prompts, conversation_history).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Failed to generate conversation summary for {user_email}: {e}");
            SUMMARY_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_transcript_verbatim() {
        let transcript = "User: I have a headache {not a placeholder}\nBot: Drink water.";
        let prompt = SummaryPrompts::default().render_user_prompt(transcript);

        assert!(prompt.contains(&format!("==================\n{transcript}\n==================")));
        assert!(prompt.ends_with("in 3-5 key points."));
    }
}
