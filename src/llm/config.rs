//! # Model Configuration
//!
//! `LlmConfig` names the remote chat-completion endpoint, the model identifier and the
//! credential used to call it. It is built through `LlmConfigBuilder`, which rejects a
//! blank API key or an unparsable endpoint before any request is attempted.

use std::time::Duration;

use url::Url;

use crate::config::{ConfigError, DEFAULT_LLM_BASE_URL, DEFAULT_REPORT_MODEL};

/// Default timeout for generation requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for a remote text-generation model
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API (e.g. `https://host/v1`)
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Bearer credential
    pub api_key: String,

    /// Request timeout
    pub timeout: Duration,
}

/// Builder for LlmConfig
#[derive(Debug)]
pub struct LlmConfigBuilder {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Default for LlmConfigBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_REPORT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfigBuilder {
    /// Create a new builder with default endpoint and model
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<LlmConfig, ConfigError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;

        Url::parse(&self.endpoint).map_err(|_| ConfigError::Invalid {
            name: "LLM_BASE_URL",
            value: self.endpoint.clone(),
        })?;

        Ok(LlmConfig {
            endpoint: self.endpoint,
            model: self.model,
            api_key,
            timeout: self.timeout,
        })
    }
}

impl LlmConfig {
    /// Create a new builder
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::new()
    }
}
