//! HTTP client shared by the text and image providers
//!
//! Wraps reqwest with base-URL joining, credential injection and status-code mapping
//! into `GenerationError`.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use crate::llm::error::GenerationError;

/// Seconds to wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// How the API key travels with each request
#[derive(Clone)]
pub enum Credential {
    /// `Authorization: Bearer <key>` (OpenAI-compatible APIs)
    Bearer(String),
    /// `x-goog-api-key: <key>` (Gemini API)
    GoogApiKey(String),
}

/// HTTP client for a single remote API
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Base URL for API requests
    base_url: String,

    credential: Credential,
}

impl HttpClient {
    /// Create a client for `base_url` with the given credential and timeout
    pub fn new(
        base_url: impl Into<String>,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credential,
        })
    }

    /// Join `path` onto the base URL
    fn build_url(&self, path: &str) -> Result<Url, GenerationError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&url).map_err(|e| GenerationError::InvalidRequest(format!("Invalid URL: {}", e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Credential::Bearer(key) => request.bearer_auth(key),
            Credential::GoogApiKey(key) => request.header("x-goog-api-key", key),
        }
    }

    /// Send a POST request with a JSON body and decode the JSON reply
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GenerationError> {
        let url = self.build_url(path)?;
        let request = self.authorize(self.client.post(url).json(body));

        debug!("Sending POST request to {}", path);
        self.execute_request(request).await
    }

    /// Download an absolute URL as raw bytes, without credentials
    #[instrument(skip(self), level = "debug")]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let url = Url::parse(url)
            .map_err(|e| GenerationError::InvalidRequest(format!("Invalid URL: {}", e)))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_status(status, None, body))
        }
    }

    /// Execute an HTTP request and handle the response
    async fn execute_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GenerationError> {
        let response = request.send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let response_text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&response_text).map_err(|e| {
                error!("Failed to parse response: {}", e);
                GenerationError::UnexpectedResponse(format!("Failed to parse response: {}", e))
            })
        } else {
            error!("API error: {} - {}", status, response_text);
            Err(map_status(status, retry_after, response_text))
        }
    }
}

fn map_status(status: StatusCode, retry_after: Option<u64>, body: String) -> GenerationError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimit {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Auth(format!("Invalid API key or credentials ({})", status.as_u16()))
        }
        _ => GenerationError::Api {
            status_code: status.as_u16(),
            message: body,
        },
    }
}
