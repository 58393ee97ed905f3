//! Error types for the seo-audit crate

use thiserror::Error;

use crate::config::ConfigError;
use crate::crawler::CrawlError;
use crate::extract::ExtractError;
use crate::llm::GenerationError;
use crate::social::SocialError;

/// Result type for seo-audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for seo-audit operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, detected before any remote call
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Site unreachable or malformed
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Reading, decoding or writing a report document failed
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Remote text or image generation failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Social content request was incomplete
    #[error("Social content error: {0}")]
    Social(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SocialError> for Error {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::Generation(e) => Error::Generation(e),
            _ => Error::Social(err.to_string()),
        }
    }
}
