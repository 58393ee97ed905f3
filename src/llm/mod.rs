//! # Remote Text Generation
//!
//! The `TextGenerator` trait is the seam between prompt assembly and whichever remote
//! model answers. `ChatClient` speaks the OpenAI-compatible chat-completions protocol;
//! `ReportGenerator` adds the optional single retry used for audit reports.
//!
//! Every call returns `Ok(text)` with the model's reply verbatim, or a tagged
//! `GenerationError`. An empty reply is a valid `Ok("")` and is never used to signal
//! failure.

mod chat;
mod config;
mod error;
pub(crate) mod http;
#[cfg(test)]
pub(crate) mod mock;
mod report;

use std::future::Future;

pub use chat::ChatClient;
pub use config::{DEFAULT_TIMEOUT_SECS, LlmConfig, LlmConfigBuilder};
pub use error::GenerationError;
pub use report::{MAX_RETRY_WAIT, ReportGenerator, generate, retry_delay};

/// A remote model that turns a prompt into text
pub trait TextGenerator {
    /// Send `prompt` and return the reply text
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

impl<T: TextGenerator + Sync> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send {
        (**self).generate(prompt)
    }
}
