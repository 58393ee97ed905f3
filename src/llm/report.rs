//! Audit report generation

use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::llm::chat::ChatClient;
use crate::llm::config::LlmConfig;
use crate::llm::error::GenerationError;
use crate::llm::TextGenerator;

/// Longest wait honored from a rate-limit reply before the retry
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

/// Wait before retrying after `error`
///
/// Rate-limit replies are waited out up to [`MAX_RETRY_WAIT`]; other transient
/// failures are retried immediately.
pub fn retry_delay(error: &GenerationError) -> Duration {
    match error {
        GenerationError::RateLimit { retry_after_secs } => {
            Duration::from_secs(*retry_after_secs).min(MAX_RETRY_WAIT)
        }
        _ => Duration::ZERO,
    }
}

/// Send one prompt to the model described by `config`
pub async fn generate(prompt: &str, config: &LlmConfig) -> Result<String, GenerationError> {
    ChatClient::new(config)?.generate(prompt).await
}

/// Wraps a generator with an optional single retry for transient failures
#[derive(Clone)]
pub struct ReportGenerator<G> {
    generator: G,
    single_retry: bool,
}

impl<G: TextGenerator + Sync> ReportGenerator<G> {
    /// Create a generator that makes exactly one attempt
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            single_retry: false,
        }
    }

    /// Allow one more attempt after a transport, rate-limit or 5xx failure, waiting out
    /// a rate limit first
    pub fn with_single_retry(mut self, single_retry: bool) -> Self {
        self.single_retry = single_retry;
        self
    }

    /// The wrapped generator
    pub fn inner(&self) -> &G {
        &self.generator
    }
}

impl<G: TextGenerator + Sync> TextGenerator for ReportGenerator<G> {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self.generator.generate(prompt).await {
            Ok(text) => {
                info!("Report generated ({} chars)", text.len());
                Ok(text)
            }
            Err(e) if self.single_retry && e.is_retryable() => {
                let delay = retry_delay(&e);
                warn!(
                    "Report generation failed, retrying once in {:?}: {}",
                    delay, e
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.generator.generate(prompt).await
            }
            Err(e) => Err(e),
        }
    }
}
