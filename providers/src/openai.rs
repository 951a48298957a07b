//! Chat-completions client shared by OpenAI and Groq.
//!
//! `POST {base_url}/chat/completions` with bearer auth. JSON requests set
//! `response_format: {"type": "json_object"}`.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Completion, CompletionRequest, LlmClient, ProviderError, ResponseFormat, Usage};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn build_request_body(
    model: &str,
    temperature: f32,
    max_tokens: u32,
    request: &CompletionRequest,
) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": request.prompt}));

    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    if request.format == ResponseFormat::Json {
        body["response_format"] = json!({"type": "json_object"});
    }
    body
}

pub(crate) async fn complete(
    client: &LlmClient,
    request: &CompletionRequest,
) -> Result<Completion, ProviderError> {
    let config = client.config();
    let url = format!("{}/chat/completions", config.base_url());
    let auth_header = format!("Bearer {}", config.api_key());
    let body = build_request_body(
        config.model().as_str(),
        config.temperature(),
        config.max_tokens(),
        request,
    );

    let response: ChatResponse = client
        .send_json(|| {
            client
                .http()
                .post(&url)
                .header("Authorization", &auth_header)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

    let text = response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)?;

    Ok(Completion {
        text,
        model: response.model,
        usage: response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::build_request_body;
    use crate::CompletionRequest;

    #[test]
    fn json_requests_ask_for_json_object() {
        let body = build_request_body(
            "llama-3.1-8b-instant",
            0.0,
            512,
            &CompletionRequest::json("Return JSON").with_system("You are an analyst"),
        );
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Return JSON");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn text_requests_have_no_response_format() {
        let body = build_request_body("gpt-4o-mini", 0.5, 100, &CompletionRequest::text("hi"));
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }
}
