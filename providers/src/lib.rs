//! LLM provider clients for the EDA agent.
//!
//! # Architecture
//!
//! Pipeline stages talk to a [`LanguageModel`]: one prompt in, one reply out.
//! [`LlmClient`] is the HTTP implementation and dispatches on the configured
//! [`Provider`]:
//!
//! - [`openai`] - chat-completions wire format, used for Groq and OpenAI
//! - [`claude`] - Anthropic Messages API
//!
//! Every request goes through [`retry::send_with_retry`]. JSON replies are
//! decoded with [`structured::parse_structured`].
//!
//! # Configuration
//!
//! [`ApiConfig`] bundles the API key, model, endpoint and sampling knobs. The
//! constructor rejects a key and model that belong to different providers.

pub mod claude;
pub mod openai;
pub mod retry;
pub mod structured;

use std::future::Future;
use std::time::Duration;

pub use eda_types;
use eda_types::{ApiKey, ModelName, Provider};
use retry::{RetryConfig, RetryOutcome};
use serde::de::DeserializeOwned;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const DEFAULT_TEMPERATURE: f32 = 0.0;
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no text")]
    EmptyResponse,
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("model reply is not the expected JSON: {message}")]
    Structured { message: String },
}

fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(concat!("eda-agent/", env!("CARGO_PKG_VERSION"))),
    );

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// HTTP client with a total request timeout. Plain-HTTP endpoints are only
/// allowed when `base_url` itself is not HTTPS (local servers, tests).
pub fn http_client_for(base_url: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let https_only = base_url.starts_with("https://");
    base_client_builder(https_only).timeout(timeout).build()
}

/// Read an error body, keeping at most 32 KiB of it.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Shape the reply should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub format: ResponseFormat,
}

impl CompletionRequest {
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            format: ResponseFormat::Text,
        }
    }

    #[must_use]
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            format: ResponseFormat::Json,
            ..Self::text(prompt)
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Anything that can answer a single prompt.
pub trait LanguageModel: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<Completion, ProviderError>> + Send;
}

/// Provider + model configuration.
///
/// ```rust
/// use eda_providers::ApiConfig;
/// use eda_types::{ApiKey, Provider};
///
/// let config = ApiConfig::new(ApiKey::new(Provider::Groq, "gsk-test"), Provider::Groq.default_model())
///     .unwrap()
///     .with_temperature(0.2);
/// assert_eq!(config.base_url(), "https://api.groq.com/openai/v1");
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    api_key: ApiKey,
    model: ModelName,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiConfigError {
    #[error("API key provider {key:?} does not match model provider {model:?}")]
    ProviderMismatch { key: Provider, model: Provider },
}

impl ApiConfig {
    pub fn new(api_key: ApiKey, model: ModelName) -> Result<Self, ApiConfigError> {
        let key_provider = api_key.provider();
        let model_provider = model.provider();
        if key_provider != model_provider {
            return Err(ApiConfigError::ProviderMismatch {
                key: key_provider,
                model: model_provider,
            });
        }

        Ok(Self {
            api_key,
            model,
            base_url: model_provider.default_base_url().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.api_key.provider()
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// HTTP-backed [`LanguageModel`].
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: ApiConfig,
    retry: RetryConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: ApiConfig, retry: RetryConfig) -> Result<Self, ProviderError> {
        let http = http_client_for(config.base_url(), config.timeout())?;
        Ok(Self::with_http_client(config, retry, http))
    }

    #[must_use]
    pub fn with_http_client(config: ApiConfig, retry: RetryConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            retry,
            http,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send with retries and decode a 2xx JSON body.
    pub(crate) async fn send_json<T, F>(&self, build_request: F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        match retry::send_with_retry(build_request, &self.retry).await {
            RetryOutcome::Success(response) => {
                let text = response.text().await?;
                serde_json::from_str(&text).map_err(ProviderError::Decode)
            }
            RetryOutcome::HttpError(response) => {
                let status = response.status().as_u16();
                let body = read_capped_error_body(response).await;
                tracing::error!(status, provider = %self.config.provider(), "LLM request rejected");
                Err(ProviderError::Status { status, body })
            }
            RetryOutcome::Transport { attempts, source } => {
                tracing::error!(attempts, error = %source, "LLM request failed");
                Err(ProviderError::Http(source))
            }
        }
    }
}

impl LanguageModel for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        tracing::debug!(
            provider = %self.config.provider(),
            model = %self.config.model(),
            format = ?request.format,
            prompt_chars = request.prompt.len(),
            "Sending completion request"
        );
        let completion = match self.config.provider() {
            Provider::Groq | Provider::OpenAI => openai::complete(self, &request).await?,
            Provider::Claude => claude::complete(self, &request).await?,
        };
        if let Some(usage) = completion.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion received"
            );
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eda_types::{ApiKey, ModelName, Provider};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{
        ApiConfig, ApiConfigError, CompletionRequest, MAX_ERROR_BODY_BYTES, ResponseFormat,
        http_client_for, read_capped_error_body,
    };

    #[test]
    fn config_rejects_mismatched_provider() {
        let err = ApiConfig::new(
            ApiKey::new(Provider::Claude, "sk-ant"),
            Provider::Groq.default_model(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiConfigError::ProviderMismatch {
                key: Provider::Claude,
                model: Provider::Groq
            }
        ));
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let config = ApiConfig::new(
            ApiKey::new(Provider::OpenAI, "sk"),
            ModelName::parse(Provider::OpenAI, "gpt-4o").unwrap(),
        )
        .unwrap()
        .with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn request_constructors() {
        let request = CompletionRequest::json("hi").with_system("be brief");
        assert_eq!(request.format, ResponseFormat::Json);
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(CompletionRequest::text("x").format, ResponseFormat::Text);
    }

    #[test]
    fn plain_http_clients_build_for_local_endpoints() {
        assert!(http_client_for("http://127.0.0.1:1", Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn oversized_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(40 * 1024)))
            .mount(&server)
            .await;
        let client = http_client_for(&server.uri(), Duration::from_secs(5)).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();

        let body = read_capped_error_body(response).await;

        assert!(body.ends_with("...(truncated)"));
        assert_eq!(body.len(), MAX_ERROR_BODY_BYTES + "...(truncated)".len());
    }

    #[tokio::test]
    async fn small_error_body_is_kept_whole() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        let client = http_client_for(&server.uri(), Duration::from_secs(5)).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();

        assert_eq!(read_capped_error_body(response).await, "slow down");
    }
}
