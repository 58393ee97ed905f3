//! OpenAI-compatible chat-completion client

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::llm::config::LlmConfig;
use crate::llm::error::GenerationError;
use crate::llm::http::{Credential, HttpClient};
use crate::llm::TextGenerator;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for a single chat model behind an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct ChatClient {
    http_client: HttpClient,
    model: String,
}

impl ChatClient {
    /// Create a client from a validated configuration
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let http_client = HttpClient::new(
            config.endpoint.clone(),
            Credential::Bearer(config.api_key.clone()),
            config.timeout,
        )?;
        Ok(Self {
            http_client,
            model: config.model.clone(),
        })
    }

    /// Model identifier used for requests
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for ChatClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Requesting chat completion");
        let response: ChatCompletionResponse =
            self.http_client.post("chat/completions", &request).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::UnexpectedResponse("reply had no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| {
                GenerationError::UnexpectedResponse("reply carried no text content".to_string())
            })?;

        trace!("Received completion of length {}", text.len());
        Ok(text)
    }
}
