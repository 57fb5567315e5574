//! # Conversation Summary Tests
//!
//! Covers the summarization pipeline end to end against a mocked chat
//! provider and against a mocked OpenAI-compatible HTTP endpoint.

mod common;

use medibot::{
    prompts::summary::CONVERSATION_SUMMARY_SYSTEM_PROMPT,
    providers::ai::OpenAiCompatibleProvider, summarize_conversation, SummaryPrompts,
    SUMMARY_FALLBACK,
};
use medibot_test_utils::MockAiProvider;
use serde_json::json;
use common::setup_tracing;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const TRANSCRIPT: &str = "User: I have had a sore throat for three days.\nBot: Any fever?\nUser: A mild one, 37.8C.";

#[tokio::test]
async fn returns_the_model_text_unchanged() {
    setup_tracing();
    let ai = MockAiProvider::new();
    let summary = "1. Sore throat for three days.\n2. Mild fever of 37.8C.";
    ai.add_response("expert medical conversation analyst", summary);

    let result =
        summarize_conversation(&ai, SummaryPrompts::default(), TRANSCRIPT, "pat@example.com").await;

    assert_eq!(result, summary);
    let calls = ai.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, CONVERSATION_SUMMARY_SYSTEM_PROMPT);
    assert!(calls[0].1.contains(TRANSCRIPT));
}

#[tokio::test]
async fn provider_failure_yields_the_fallback() {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_failure("expert medical conversation analyst", "rate limited");

    let result =
        summarize_conversation(&ai, SummaryPrompts::default(), TRANSCRIPT, "pat@example.com").await;

    assert_eq!(result, SUMMARY_FALLBACK);
}

#[tokio::test]
async fn blank_reply_yields_the_fallback() {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response("expert medical conversation analyst", "   \n ");

    let result =
        summarize_conversation(&ai, SummaryPrompts::default(), TRANSCRIPT, "pat@example.com").await;

    assert_eq!(result, SUMMARY_FALLBACK);
}

#[tokio::test]
async fn empty_history_is_still_sent_to_the_model() {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response("expert medical conversation analyst", "No conversation took place.");

    let result = summarize_conversation(&ai, SummaryPrompts::default(), "", "pat@example.com").await;

    assert_eq!(result, "No conversation took place.");
    assert_eq!(ai.get_calls().len(), 1);
}

#[tokio::test]
async fn summarizes_through_an_openai_compatible_endpoint() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "deepseek-r1-distill-llama-70b",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "1. Sore throat."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(
        format!("{}/openai/v1/chat/completions", server.uri()),
        Some("test-key".to_string()),
        Some("deepseek-r1-distill-llama-70b".to_string()),
    )
    .unwrap()
    .temperature(0.3);

    let result =
        summarize_conversation(&provider, SummaryPrompts::default(), TRANSCRIPT, "pat@example.com")
            .await;

    assert_eq!(result, "1. Sore throat.");
}

#[tokio::test]
async fn http_error_from_the_endpoint_yields_the_fallback() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAiCompatibleProvider::new(
        server.uri(),
        Some("bad-key".to_string()),
        Some("deepseek-r1-distill-llama-70b".to_string()),
    )
    .unwrap();

    let result =
        summarize_conversation(&provider, SummaryPrompts::default(), TRANSCRIPT, "pat@example.com")
            .await;

    assert_eq!(result, SUMMARY_FALLBACK);
}
