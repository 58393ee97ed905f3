//! # Environment Configuration
//!
//! Settings are read from the process environment after loading an optional `.env`
//! file. Credentials are only checked when a component that needs them is built, so
//! a crawl or an extraction never requires an API key, while a report or image
//! request fails fast before any network call.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::llm::LlmConfig;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";
pub const DEFAULT_REPORT_MODEL: &str = "accounts/fireworks/models/kimi-k2-instruct-0905";
pub const DEFAULT_SOCIAL_MODEL: &str = "accounts/fireworks/models/gpt-oss-120b";
pub const DEFAULT_IMAGEN_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IMAGEN_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_OPENAI_IMAGE_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "gpt-image-1";

/// Error type for configuration problems
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("{0} is not set (add it to the environment or a .env file)")]
    MissingVar(&'static str),

    /// A variable holds a value that cannot be used
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Which remote image API renders post images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageBackend {
    /// Google Imagen through the Gemini API
    #[default]
    Imagen,
    /// OpenAI-compatible `/images/generations`
    OpenAi,
}

impl FromStr for ImageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imagen" | "gemini" | "google" => Ok(Self::Imagen),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown image backend '{other}' (expected imagen or openai)")),
        }
    }
}

impl fmt::Display for ImageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imagen => write!(f, "imagen"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Connection settings for an image provider
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub backend: ImageBackend,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

/// Settings resolved from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub report_model: String,
    pub social_model: String,
    pub gemini_api_key: Option<String>,
    pub image_backend: ImageBackend,
    pub image_model: Option<String>,
    pub image_base_url: Option<String>,
}

impl Settings {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let image_backend = match get("IMAGE_BACKEND") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "IMAGE_BACKEND",
                value,
            })?,
            None => ImageBackend::default(),
        };

        Ok(Self {
            llm_api_key: get("OPENAI_API_KEY"),
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            report_model: get("SEO_REPORT_MODEL")
                .unwrap_or_else(|| DEFAULT_REPORT_MODEL.to_string()),
            social_model: get("SOCIAL_MODEL").unwrap_or_else(|| DEFAULT_SOCIAL_MODEL.to_string()),
            gemini_api_key: get("GEMINI_API_KEY"),
            image_backend,
            image_model: get("IMAGE_MODEL"),
            image_base_url: get("IMAGE_BASE_URL"),
        })
    }

    fn llm(&self, model: &str) -> Result<LlmConfig, ConfigError> {
        let api_key = self
            .llm_api_key
            .clone()
            .ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;
        LlmConfig::builder()
            .endpoint(&self.llm_base_url)
            .model(model)
            .api_key(api_key)
            .build()
    }

    /// Model settings for the SEO audit report
    pub fn report_llm(&self) -> Result<LlmConfig, ConfigError> {
        self.llm(&self.report_model)
    }

    /// Model settings for topic suggestions and social posts
    pub fn social_llm(&self) -> Result<LlmConfig, ConfigError> {
        self.llm(&self.social_model)
    }

    /// Settings for the configured image backend
    pub fn image(&self) -> Result<ImageConfig, ConfigError> {
        let (api_key, default_endpoint, default_model) = match self.image_backend {
            ImageBackend::Imagen => (
                self.gemini_api_key
                    .clone()
                    .ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?,
                DEFAULT_IMAGEN_BASE_URL,
                DEFAULT_IMAGEN_MODEL,
            ),
            ImageBackend::OpenAi => (
                self.llm_api_key
                    .clone()
                    .ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?,
                DEFAULT_OPENAI_IMAGE_BASE_URL,
                DEFAULT_OPENAI_IMAGE_MODEL,
            ),
        };

        Ok(ImageConfig {
            backend: self.image_backend,
            endpoint: self
                .image_base_url
                .clone()
                .unwrap_or_else(|| default_endpoint.to_string()),
            model: self
                .image_model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_keys() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.llm_base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.report_model, DEFAULT_REPORT_MODEL);
        assert_eq!(settings.social_model, DEFAULT_SOCIAL_MODEL);
        assert_eq!(settings.image_backend, ImageBackend::Imagen);
    }

    #[test]
    fn test_missing_api_key_is_reported_eagerly() {
        let settings = settings(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert_eq!(
            settings.report_llm().unwrap_err(),
            ConfigError::MissingVar("OPENAI_API_KEY")
        );
        assert_eq!(
            settings.image().unwrap_err(),
            ConfigError::MissingVar("GEMINI_API_KEY")
        );
    }

    #[test]
    fn test_report_and_social_models_differ() {
        let settings = settings(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let report = settings.report_llm().unwrap();
        let social = settings.social_llm().unwrap();
        assert_eq!(report.model, DEFAULT_REPORT_MODEL);
        assert_eq!(social.model, DEFAULT_SOCIAL_MODEL);
        assert_eq!(report.api_key, "sk-test");
    }

    #[test]
    fn test_openai_image_backend_uses_llm_key() {
        let settings = settings(&[("OPENAI_API_KEY", "sk-test"), ("IMAGE_BACKEND", "OpenAI")]).unwrap();
        let image = settings.image().unwrap();
        assert_eq!(image.backend, ImageBackend::OpenAi);
        assert_eq!(image.api_key, "sk-test");
        assert_eq!(image.model, DEFAULT_OPENAI_IMAGE_MODEL);
    }

    #[test]
    fn test_unknown_image_backend() {
        let err = settings(&[("IMAGE_BACKEND", "midjourney")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "IMAGE_BACKEND", .. }));
    }
}
