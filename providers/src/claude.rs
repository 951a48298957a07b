//! Anthropic Messages API client.
//!
//! `POST {base_url}/v1/messages`. There is no JSON mode, so JSON requests
//! get an extra system instruction instead.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Completion, CompletionRequest, LlmClient, ProviderError, ResponseFormat, Usage};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const JSON_INSTRUCTION: &str =
    "Respond with a single JSON object and nothing else. Do not wrap it in Markdown.";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn system_prompt(request: &CompletionRequest) -> Option<String> {
    match (request.system.as_deref(), request.format) {
        (Some(system), ResponseFormat::Json) => Some(format!("{system}\n\n{JSON_INSTRUCTION}")),
        (None, ResponseFormat::Json) => Some(JSON_INSTRUCTION.to_string()),
        (system, ResponseFormat::Text) => system.map(str::to_string),
    }
}

fn build_request_body(
    model: &str,
    temperature: f32,
    max_tokens: u32,
    request: &CompletionRequest,
) -> Value {
    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": temperature,
        "messages": [{"role": "user", "content": request.prompt}],
    });
    if let Some(system) = system_prompt(request) {
        body["system"] = Value::String(system);
    }
    body
}

pub(crate) async fn complete(
    client: &LlmClient,
    request: &CompletionRequest,
) -> Result<Completion, ProviderError> {
    let config = client.config();
    let url = format!("{}/v1/messages", config.base_url());
    let api_key = config.api_key().to_string();
    let body = build_request_body(
        config.model().as_str(),
        config.temperature(),
        config.max_tokens(),
        request,
    );

    let response: MessagesResponse = client
        .send_json(|| {
            client
                .http()
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

    let text: String = response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    Ok(Completion {
        text,
        model: response.model,
        usage: response.usage.map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
    })
}
