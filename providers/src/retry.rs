//! Retry policy for LLM HTTP calls.
//!
//! - At most `max_retries` retries after the first attempt (2 by default).
//! - Exponential backoff from 500 ms, capped at 8 s, with down-jitter of up
//!   to 25%.
//! - Retryable: HTTP 408, 409, 429, 5xx and transport failures. The server
//!   can force or forbid a retry with `x-should-retry`.
//! - `Retry-After-Ms` / `Retry-After` replace the computed backoff when they
//!   fall inside `(0, 60s)`.
//! - Every attempt carries `X-Retry-Count` and one `Idempotency-Key` shared
//!   by all attempts of the same logical request.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};
use uuid::Uuid;

pub const RETRY_COUNT_HEADER: &str = "X-Retry-Count";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
const IDEMPOTENCY_KEY_PREFIX: &str = "eda-agent-";

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Fraction the computed delay may be reduced by (0.25 = up to 25%).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Server-requested delay from `Retry-After-Ms` (float milliseconds) or
/// `Retry-After` (integer seconds).
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let in_range = |d: Duration| d > Duration::ZERO && d < Duration::from_secs(60);

    let from_ms = headers
        .get("retry-after-ms")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| Duration::from_secs_f64(ms / 1000.0))
        .filter(|d| in_range(*d));
    if from_ms.is_some() {
        return from_ms;
    }

    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .filter(|d| in_range(*d))
}

#[must_use]
pub fn should_retry(status: StatusCode, headers: &HeaderMap) -> bool {
    match headers
        .get("x-should-retry")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    {
        Some(v) if v.eq_ignore_ascii_case("true") => return true,
        Some(v) if v.eq_ignore_ascii_case("false") => return false,
        _ => {}
    }
    matches!(status.as_u16(), 408 | 409 | 429 | 500..=599)
}

/// Delay before retry number `backoff_step + 1`.
#[must_use]
pub fn calculate_retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(delay) = headers.and_then(parse_retry_after) {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor.clamp(0.0, 1.0);
    Duration::from_secs_f64(capped * jitter)
}

pub fn add_retry_headers(
    builder: RequestBuilder,
    retry_count: u32,
    idempotency_key: &str,
) -> RequestBuilder {
    builder
        .header(RETRY_COUNT_HEADER, retry_count.to_string())
        .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
}

#[must_use]
pub fn generate_idempotency_key() -> String {
    format!("{IDEMPOTENCY_KEY_PREFIX}{}", Uuid::new_v4())
}

/// How a retried request ended.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx response that was not (or no longer) retryable.
    HttpError(Response),
    /// Transport failure on the last allowed attempt, or one that is not
    /// worth retrying.
    Transport {
        attempts: u32,
        source: reqwest::Error,
    },
}

impl RetryOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Send the request built by `build_request`, retrying per `config`.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let idempotency_key = generate_idempotency_key();
    let mut attempt = 0;

    loop {
        let can_retry = attempt < config.max_retries;
        let request = add_retry_headers(build_request(), attempt, &idempotency_key);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                return RetryOutcome::Success(response);
            }
            Ok(response) => {
                let status = response.status();
                if !can_retry || !should_retry(status, response.headers()) {
                    return RetryOutcome::HttpError(response);
                }
                let delay = calculate_retry_delay(attempt, config, Some(response.headers()));
                tracing::warn!(
                    %status,
                    retry = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "LLM request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(source) => {
                if !can_retry || !is_retryable_error(&source) {
                    return RetryOutcome::Transport {
                        attempts: attempt + 1,
                        source,
                    };
                }
                let delay = calculate_retry_delay(attempt, config, None);
                tracing::warn!(
                    error = %source,
                    retry = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "LLM request could not be sent, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
        attempt += 1;
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
