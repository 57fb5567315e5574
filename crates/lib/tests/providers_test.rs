//! # Provider Client Tests
//!
//! Exercises the HTTP clients built by the provider factory against mocked
//! chat and embeddings endpoints.

mod common;

use common::setup_tracing;
use medibot::{
    constants::MISSING_API_KEY_PLACEHOLDER,
    providers::{
        ai::embedding::EmbeddingApi,
        factory::{build_ai_provider, build_embedding_provider, EmbeddingConfig, ProviderConfig},
    },
    PromptError,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn chat_config(provider: &str, api_url: Option<String>, api_key: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        provider: provider.to_string(),
        api_url,
        api_key: api_key.map(String::from),
        model_name: "deepseek-r1-distill-llama-70b".to_string(),
        temperature: 0.3,
        max_tokens: Some(512),
    }
}

#[tokio::test]
async fn chat_provider_sends_system_and_user_messages() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello there."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = chat_config(
        "groq",
        Some(format!("{}/v1/chat/completions", server.uri())),
        Some("gsk-test"),
    );
    let provider = build_ai_provider("groq_default", &config, None).unwrap();
    let reply = provider.generate("be brief", "hi").await.unwrap();
    assert_eq!(reply, "Hello there.");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0], json!({"role": "system", "content": "be brief"}));
    assert_eq!(body["messages"][1], json!({"role": "user", "content": "hi"}));
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["stream"], false);
}

#[tokio::test]
async fn missing_key_is_sent_as_the_placeholder() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(
            "authorization",
            format!("Bearer {MISSING_API_KEY_PLACEHOLDER}").as_str(),
        ))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Key"))
        .expect(1)
        .mount(&server)
        .await;

    let config = chat_config("groq", Some(server.uri()), None);
    let provider = build_ai_provider("groq_default", &config, None).unwrap();
    let err = provider.generate("s", "u").await.unwrap_err();

    match err {
        PromptError::AiApi(message) => assert!(message.contains("401")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn chat_request_times_out() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = chat_config("local", Some(server.uri()), None);
    let provider =
        build_ai_provider("local_default", &config, Some(Duration::from_millis(200))).unwrap();

    assert!(matches!(
        provider.generate("s", "u").await,
        Err(PromptError::AiRequest(_))
    ));
}

#[tokio::test]
async fn ollama_embeddings_carry_no_sampling_parameters() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_json(json!({"model": "nomic-embed-text", "input": "take twice daily"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "nomic-embed-text",
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        api_url: format!("{}/api/embed", server.uri()),
        model_name: "nomic-embed-text".to_string(),
        api_key: None,
    };
    let provider = build_embedding_provider(&config, None).unwrap();
    let vector = provider.embed("take twice daily").await.unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn openai_compatible_embeddings_are_parsed() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer emb-key"))
        .and(body_json(json!({"model": "text-embedding-3-small", "input": "ibuprofen"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [1.0, 0.0], "index": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        api_url: format!("{}/v1/embeddings", server.uri()),
        model_name: "text-embedding-3-small".to_string(),
        api_key: Some("emb-key".to_string()),
    };
    assert_eq!(EmbeddingApi::detect(&config.api_url), EmbeddingApi::OpenAi);
    let provider = build_embedding_provider(&config, None).unwrap();

    assert_eq!(provider.embed("ibuprofen").await.unwrap(), vec![1.0, 0.0]);
}

#[tokio::test]
async fn empty_embedding_response_is_an_error() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": []})))
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        api_url: format!("{}/api/embed", server.uri()),
        model_name: "nomic-embed-text".to_string(),
        api_key: None,
    };
    let provider = build_embedding_provider(&config, None).unwrap();

    assert!(provider.embed("x").await.is_err());
}
