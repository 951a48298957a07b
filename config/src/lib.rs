//! `~/.eda-agent/config.toml` loading.
//!
//! Every section is optional; anything left out falls back to the provider
//! and analysis defaults. String values in `[api_keys]` may reference
//! environment variables as `${VAR}`.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use eda_dataset::CsvOptions;
use eda_providers::{ApiConfig, ApiConfigError};
use eda_providers::retry::RetryConfig;
use eda_types::{
    AnalysisSettings, ApiKey, ModelName, ModelParseError, Provider, ProviderParseError,
};
use serde::Deserialize;

const DEFAULT_REPAIR_ATTEMPTS: u32 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct EdaConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub endpoints: Option<EndpointsConfig>,
    pub llm: Option<LlmConfig>,
    pub analysis: Option<AnalysisSettings>,
    pub csv: Option<CsvConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    UnknownProvider(#[from] ProviderParseError),
    #[error("invalid model `{model}`: {source}")]
    InvalidModel {
        model: String,
        #[source]
        source: ModelParseError,
    },
    #[error("no API key for {provider}: set [api_keys] in the config or {env_var}")]
    MissingApiKey {
        provider: Provider,
        env_var: &'static str,
    },
    #[error(transparent)]
    ProviderMismatch(#[from] ApiConfigError),
    #[error("CSV delimiter must be a single ASCII character (got {0:?})")]
    InvalidDelimiter(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub groq: Option<String>,
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(opt: Option<&String>) -> &'static str {
            if opt.is_some() { "[REDACTED]" } else { "None" }
        }
        f.debug_struct("ApiKeys")
            .field("groq", &mask(self.groq.as_ref()))
            .field("openai", &mask(self.openai.as_ref()))
            .field("anthropic", &mask(self.anthropic.as_ref()))
            .finish()
    }
}

impl ApiKeys {
    fn for_provider(&self, provider: Provider) -> Option<&String> {
        match provider {
            Provider::Groq => self.groq.as_ref(),
            Provider::OpenAI => self.openai.as_ref(),
            Provider::Claude => self.anthropic.as_ref(),
        }
    }
}

/// Base URL overrides, e.g. a proxy or a local OpenAI-compatible server.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsConfig {
    pub groq: Option<String>,
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    /// Follow-up requests sent when a JSON reply fails to parse.
    pub structured_repair_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CsvConfig {
    pub delimiter: Option<String>,
}

/// Replace `${VAR}` with the variable's value (empty when unset).
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".eda-agent").join("config.toml"))
}

impl EdaConfig {
    /// Load the default config file. `Ok(None)` when it does not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Provider from `override_provider`, then `[app].provider`, then Groq.
    pub fn provider(&self, override_provider: Option<&str>) -> Result<Provider, ConfigError> {
        let configured = self.app.as_ref().and_then(|app| app.provider.as_deref());
        match override_provider.or(configured) {
            Some(raw) => Ok(Provider::parse(raw)?),
            None => Ok(Provider::default()),
        }
    }

    /// Model from `override_model`, then `[app].model` when it was written
    /// for `provider`, then the provider default.
    pub fn model(
        &self,
        provider: Provider,
        override_model: Option<&str>,
    ) -> Result<ModelName, ConfigError> {
        let configured = self.app.as_ref().and_then(|app| app.model.as_deref());
        let configured_provider = self.provider(None).unwrap_or_default();
        let raw = override_model.or(configured.filter(|_| configured_provider == provider));
        match raw {
            Some(raw) => ModelName::parse(provider, raw).map_err(|source| {
                ConfigError::InvalidModel {
                    model: raw.to_string(),
                    source,
                }
            }),
            None => Ok(provider.default_model()),
        }
    }

    /// Config value first, then the provider's environment variable.
    pub fn resolve_api_key(&self, provider: Provider) -> Result<ApiKey, ConfigError> {
        self.resolve_api_key_with(provider, |name| env::var(name).ok())
    }

    pub fn resolve_api_key_with(
        &self,
        provider: Provider,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ApiKey, ConfigError> {
        let from_config = self
            .api_keys
            .as_ref()
            .and_then(|keys| keys.for_provider(provider))
            .map(|raw| expand_env_vars(raw).trim().to_string())
            .filter(|key| !key.is_empty());
        if let Some(key) = from_config {
            return Ok(ApiKey::new(provider, key));
        }

        let env_var = provider.env_var();
        lookup(env_var)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|key| ApiKey::new(provider, key))
            .ok_or(ConfigError::MissingApiKey { provider, env_var })
    }

    #[must_use]
    pub fn base_url(&self, provider: Provider) -> String {
        let endpoints = self.endpoints.as_ref();
        let configured = match provider {
            Provider::Groq => endpoints.and_then(|e| e.groq.as_ref()),
            Provider::OpenAI => endpoints.and_then(|e| e.openai.as_ref()),
            Provider::Claude => endpoints.and_then(|e| e.anthropic.as_ref()),
        };
        configured
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string())
    }

    /// Everything the LLM client needs for one run.
    pub fn api_config(
        &self,
        override_provider: Option<&str>,
        override_model: Option<&str>,
    ) -> Result<ApiConfig, ConfigError> {
        let provider = self.provider(override_provider)?;
        let model = self.model(provider, override_model)?;
        let key = self.resolve_api_key(provider)?;
        self.build_api_config(key, model)
    }

    /// Assemble an [`ApiConfig`] from an already resolved key and model.
    pub fn build_api_config(&self, key: ApiKey, model: ModelName) -> Result<ApiConfig, ConfigError> {
        let provider = model.provider();
        let mut config = ApiConfig::new(key, model)?.with_base_url(self.base_url(provider));

        if let Some(llm) = &self.llm {
            if let Some(temperature) = llm.temperature {
                config = config.with_temperature(temperature);
            }
            if let Some(max_tokens) = llm.max_tokens {
                config = config.with_max_tokens(max_tokens);
            }
            if let Some(secs) = llm.timeout_seconds.filter(|secs| *secs > 0) {
                config = config.with_timeout(Duration::from_secs(secs));
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        let retry = RetryConfig::default();
        match self.llm.as_ref().and_then(|llm| llm.max_retries) {
            Some(max_retries) => retry.with_max_retries(max_retries),
            None => retry,
        }
    }

    #[must_use]
    pub fn repair_attempts(&self) -> u32 {
        self.llm
            .as_ref()
            .and_then(|llm| llm.structured_repair_attempts)
            .unwrap_or(DEFAULT_REPAIR_ATTEMPTS)
    }

    #[must_use]
    pub fn analysis_settings(&self) -> AnalysisSettings {
        self.analysis.unwrap_or_default()
    }

    pub fn csv_options(&self) -> Result<CsvOptions, ConfigError> {
        let Some(raw) = self.csv.as_ref().and_then(|csv| csv.delimiter.as_deref()) else {
            return Ok(CsvOptions::default());
        };
        let delimiter = match raw {
            "\\t" | "tab" => b'\t',
            other if other.len() == 1 && other.is_ascii() => other.as_bytes()[0],
            other => return Err(ConfigError::InvalidDelimiter(other.to_string())),
        };
        Ok(CsvOptions { delimiter })
    }
}
