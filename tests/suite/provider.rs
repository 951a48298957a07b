//! LLM client tests against mocked provider endpoints

use eda_providers::{CompletionRequest, LanguageModel, ProviderError};
use eda_types::Provider;
use wiremock::MockServer;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    client_for, mount_chat_response, mount_claude_response, mount_error_response,
};

#[tokio::test]
async fn groq_completion_reads_first_choice() {
    let server = MockServer::start().await;
    mount_chat_response(&server, "regression").await;

    let client = client_for(&server, Provider::Groq);
    let completion = client
        .complete(CompletionRequest::text("What problem is this?"))
        .await
        .unwrap();

    assert_eq!(completion.text, "regression");
    assert_eq!(completion.model.as_deref(), Some("llama-3.1-8b-instant"));
    let usage = completion.usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (12, 7));
}

#[tokio::test]
async fn json_requests_ask_for_json_object_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Provider::OpenAI);
    let completion = client
        .complete(CompletionRequest::json("Return JSON").with_system("Be terse"))
        .await
        .unwrap();

    assert_eq!(completion.text, "{\"ok\": true}");
    assert!(completion.usage.is_none());
}

#[tokio::test]
async fn claude_completion_uses_messages_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                {"type": "text", "text": "Two "},
                {"type": "text", "text": "clusters."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Provider::Claude);
    let completion = client
        .complete(CompletionRequest::text("Describe"))
        .await
        .unwrap();

    assert_eq!(completion.text, "Two clusters.");
}

#[tokio::test]
async fn claude_fixture_reply_round_trips() {
    let server = MockServer::start().await;
    mount_claude_response(&server, "descriptive_analysis first").await;

    let client = client_for(&server, Provider::Claude);
    let completion = client.complete(CompletionRequest::text("Plan")).await.unwrap();

    assert_eq!(completion.text, "descriptive_analysis first");
    assert!(completion.usage.is_some());
}

#[tokio::test]
async fn error_status_carries_body() {
    let server = MockServer::start().await;
    mount_error_response(&server, "/chat/completions", 401, "invalid api key").await;

    let client = client_for(&server, Provider::Groq);
    let err = client
        .complete(CompletionRequest::text("hi"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"), "{body}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_content_is_an_empty_response() {
    let server = MockServer::start().await;
    mount_chat_response(&server, "   ").await;

    let client = client_for(&server, Provider::Groq);
    let err = client
        .complete(CompletionRequest::text("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::EmptyResponse));
}
