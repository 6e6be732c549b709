use crate::error::ApiError;
use crate::provider::{CompletionOptions, OpenAiClient, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Chat model identifier.
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API key optional and can be loaded from environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; defaults per provider type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Default completion options for this provider.
    #[serde(default = "default_completion_options")]
    pub default_options: CompletionOptions,

    /// Per-request timeout for embedding and completion calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts for retryable embedding failures during index builds.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: usize,

    /// Base delay between retries (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Provider type enumeration. All speak the OpenAI wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "local")]
    LocalCustom,
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_completion_options() -> CompletionOptions {
    CompletionOptions {
        temperature: Some(0.7),
        max_tokens: None,
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retry_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_key: None,
            endpoint: None,
            default_options: default_completion_options(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ProviderType {
    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("https://api.openai.com/v1"),
            ProviderType::Ollama => Some("http://localhost:11434/v1"),
            ProviderType::LocalCustom => None,
        }
    }

    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
            ProviderType::LocalCustom => "local",
        }
    }
}

impl ProviderConfig {
    fn endpoint_has_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("http://") || endpoint.starts_with("https://")
    }

    fn infer_endpoint_scheme(provider_type: ProviderType, endpoint: &str) -> String {
        let endpoint = endpoint.trim();
        if provider_type == ProviderType::LocalCustom && !Self::endpoint_has_scheme(endpoint) {
            format!("https://{}", endpoint)
        } else {
            endpoint.to_string()
        }
    }

    /// Configured endpoint with scheme inferred, or the provider default.
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(|endpoint| Self::infer_endpoint_scheme(self.provider_type, endpoint))
            .or_else(|| self.provider_type.default_endpoint().map(str::to_string))
    }

    pub fn endpoint_url_is_valid(provider_type: ProviderType, endpoint: &str) -> bool {
        let endpoint = Self::infer_endpoint_scheme(provider_type, endpoint);
        let Some(rest) = endpoint.split_once("://").map(|(_, rest)| rest) else {
            return false;
        };
        if !Self::endpoint_has_scheme(&endpoint)
            || rest.is_empty()
            || rest.chars().any(char::is_whitespace)
        {
            return false;
        }

        let authority = rest.split('/').next().unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or(authority);
        let host = if host_port.starts_with('[') {
            match host_port.find(']') {
                Some(end) => &host_port[1..end],
                None => return false,
            }
        } else {
            host_port.split(':').next().unwrap_or_default()
        };

        !host.is_empty()
            && (host == "localhost"
                || host.contains('.')
                || host.parse::<std::net::IpAddr>().is_ok())
    }

    /// API key from config, falling back to the provider's environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.provider_type
                .api_key_env_var()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty())
        })
    }

    /// Validate provider configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if self.embedding_model.trim().is_empty() {
            return Err("Embedding model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !Self::endpoint_url_is_valid(self.provider_type, endpoint) {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if let Some(temp) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temp
                ));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retry_attempts, self.retry_delay_ms)
    }

    /// Build the HTTP client for this provider.
    pub fn build_client(&self) -> Result<OpenAiClient, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;

        let endpoint = self.resolved_endpoint().ok_or_else(|| {
            ApiError::ConfigError("Local provider requires an endpoint".to_string())
        })?;
        let api_key = self.resolved_api_key();
        if self.provider_type == ProviderType::OpenAI && api_key.is_none() {
            return Err(ApiError::ConfigError(
                "OpenAI API key required (set provider.api_key or OPENAI_API_KEY)".to_string(),
            ));
        }

        OpenAiClient::new(
            endpoint,
            api_key,
            self.model.clone(),
            self.embedding_model.clone(),
            self.timeout(),
        )
        .map_err(ApiError::Provider)
    }
}
