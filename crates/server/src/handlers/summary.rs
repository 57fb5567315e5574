//! # Conversation Summary Handler
//!
//! Turns a chat transcript into a short medical summary.

use super::{AppError, AppState};
use crate::{config::CONVERSATION_SUMMARY_TASK, types::{SummarizeRequest, SummarizeResponse}};
use axum::{extract::State, Json};
use medibot::{summarize_conversation, SummaryPrompts};

/// Summarizes a chat transcript.
///
/// Generation failures never surface here: the body then carries the fallback
/// summary with a 200 status.
pub async fn summarize_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let (task, provider) = app_state.task(CONVERSATION_SUMMARY_TASK)?;
    let prompts = SummaryPrompts {
        system_prompt: &task.system_prompt,
        user_prompt_template: &task.user_prompt,
    };

    let summary = summarize_conversation(
        provider,
        prompts,
        &payload.conversation_history,
        &payload.user_email,
    )
    .await;

    Ok(Json(SummarizeResponse { summary }))
}
