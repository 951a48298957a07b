//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use eda_providers::retry::RetryConfig;
use eda_providers::{ApiConfig, LlmClient};
use eda_types::{ApiKey, Provider};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HOUSES_CSV: &str = "\
rooms,area,city,price
1,40,north,100
2,55,south,150
2,60,north,160
3,75,south,210
3,80,north,220
4,95,south,270
4,100,north,280
5,120,south,330
5,125,north,340
6,900,south,400
";

/// Write `contents` to a temporary `.csv` file that lives as long as the handle.
pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp csv");
    file.write_all(contents.as_bytes()).expect("write temp csv");
    file
}

/// Client pointed at `server`, with retries disabled so failures surface at once.
pub fn client_for(server: &MockServer, provider: Provider) -> LlmClient {
    let config = ApiConfig::new(ApiKey::new(provider, "test-key"), provider.default_model())
        .expect("provider matches model")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    LlmClient::new(config, RetryConfig::default().with_max_retries(0)).expect("build client")
}

fn chat_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama-3.1-8b-instant",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
    })
}

/// Chat Completions reply (Groq and OpenAI), answered for every request.
pub async fn mount_chat_response(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .mount(server)
        .await;
}

/// Chat Completions replies consumed in order, one request each.
pub async fn mount_chat_sequence(server: &MockServer, contents: &[String]) {
    for content in contents {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .up_to_n_times(1)
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Anthropic Messages API reply.
pub async fn mount_claude_response(server: &MockServer, content: &str) {
    let body = serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [{"type": "text", "text": content}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 20}
    });

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_error_response(server: &MockServer, route: &str, status: u16, message: &str) {
    let body = serde_json::json!({
        "error": {"type": "invalid_request_error", "message": message}
    });

    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
