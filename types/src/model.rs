//! LLM provider enumeration, provider-scoped model names and API keys.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported LLM providers.
///
/// Groq and OpenAI share the chat-completions wire format; Claude uses the
/// Anthropic Messages API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Groq,
    OpenAI,
    Claude,
}

const PROVIDER_PARSE_VALUES: &[&str] = &["groq", "openai", "gpt", "claude", "anthropic"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid provider '{raw}'; expected one of: {expected:?}")]
pub struct ProviderParseError {
    raw: String,
    expected: &'static [&'static str],
}

impl ProviderParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAI => "openai",
            Provider::Claude => "claude",
        }
    }

    #[must_use]
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Claude => "ANTHROPIC_API_KEY",
        }
    }

    /// Base URL of the provider's public API.
    #[must_use]
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Claude => "https://api.anthropic.com",
        }
    }

    #[must_use]
    pub fn default_model(&self) -> ModelName {
        match self {
            Provider::Groq => ModelName::known(*self, "llama-3.1-8b-instant"),
            Provider::OpenAI => ModelName::known(*self, "gpt-4o-mini"),
            Provider::Claude => ModelName::known(*self, "claude-sonnet-4-5-20250929"),
        }
    }

    /// Models this crate has been exercised against.
    #[must_use]
    pub fn available_models(&self) -> &'static [&'static str] {
        match self {
            Provider::Groq => &[
                "llama-3.1-8b-instant",
                "llama-3.3-70b-versatile",
                "openai/gpt-oss-20b",
            ],
            Provider::OpenAI => &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini"],
            Provider::Claude => &["claude-sonnet-4-5-20250929", "claude-haiku-4-5-20251001"],
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProviderParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "openai" | "gpt" => Ok(Provider::OpenAI),
            "claude" | "anthropic" => Ok(Provider::Claude),
            _ => Err(ProviderParseError {
                raw: s.to_string(),
                expected: PROVIDER_PARSE_VALUES,
            }),
        }
    }

    #[must_use]
    pub fn all() -> &'static [Provider] {
        &[Provider::Groq, Provider::OpenAI, Provider::Claude]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a model name is verified/known or user-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelNameKind {
    Known,
    #[default]
    Unverified,
}

#[derive(Debug, Error)]
pub enum ModelParseError {
    #[error("model name cannot be empty")]
    Empty,
    #[error("Claude model must start with claude- (got {0})")]
    ClaudePrefix(String),
}

/// Provider-scoped model name.
///
/// Groq hosts many model families, so only Claude enforces a prefix; unknown
/// names are accepted and marked [`ModelNameKind::Unverified`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelName {
    provider: Provider,
    #[serde(rename = "model")]
    name: Cow<'static, str>,
    #[serde(default)]
    kind: ModelNameKind,
}

impl ModelName {
    pub fn parse(provider: Provider, raw: &str) -> Result<Self, ModelParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelParseError::Empty);
        }

        if provider == Provider::Claude && !trimmed.to_ascii_lowercase().starts_with("claude-") {
            return Err(ModelParseError::ClaudePrefix(trimmed.to_string()));
        }

        if let Some(known) = provider
            .available_models()
            .iter()
            .find(|model| model.eq_ignore_ascii_case(trimmed))
        {
            return Ok(Self {
                provider,
                name: Cow::Borrowed(*known),
                kind: ModelNameKind::Known,
            });
        }

        Ok(Self {
            provider,
            name: Cow::Owned(trimmed.to_string()),
            kind: ModelNameKind::Unverified,
        })
    }

    #[must_use]
    pub const fn known(provider: Provider, name: &'static str) -> Self {
        Self {
            provider,
            name: Cow::Borrowed(name),
            kind: ModelNameKind::Known,
        }
    }

    #[must_use]
    pub const fn provider(&self) -> Provider {
        self.provider
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.name.as_ref()
    }

    #[must_use]
    pub const fn kind(&self) -> ModelNameKind {
        self.kind
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// Provider-scoped API key.
///
/// `Debug` is manually implemented to redact the key value.
#[derive(Clone)]
pub enum ApiKey {
    Groq(String),
    OpenAI(String),
    Claude(String),
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKey::Groq(_) => write!(f, "ApiKey::Groq(<redacted>)"),
            ApiKey::OpenAI(_) => write!(f, "ApiKey::OpenAI(<redacted>)"),
            ApiKey::Claude(_) => write!(f, "ApiKey::Claude(<redacted>)"),
        }
    }
}

impl ApiKey {
    #[must_use]
    pub fn new(provider: Provider, key: impl Into<String>) -> Self {
        let key = key.into();
        match provider {
            Provider::Groq => ApiKey::Groq(key),
            Provider::OpenAI => ApiKey::OpenAI(key),
            Provider::Claude => ApiKey::Claude(key),
        }
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            ApiKey::Groq(_) => Provider::Groq,
            ApiKey::OpenAI(_) => Provider::OpenAI,
            ApiKey::Claude(_) => Provider::Claude,
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        match self {
            ApiKey::Groq(key) | ApiKey::OpenAI(key) | ApiKey::Claude(key) => key,
        }
    }
}
