//! Image generation behind a provider-agnostic interface
//!
//! Providers answer with one of several JSON shapes. The first generated-image object is
//! handed to an ordered chain of `ShapeDetector`s; the first detector that recognises it
//! wins.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ImageBackend, ImageConfig};
use crate::llm::http::{Credential, HttpClient};
use crate::llm::{DEFAULT_TIMEOUT_SECS, GenerationError};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Image bytes with the MIME type sniffed from their header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes);
        Self { bytes, mime_type }
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PNG_MAGIC) {
        "image/png"
    } else if bytes.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Where the image bytes can be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    /// Remote location that still has to be downloaded
    Url(String),
}

/// Recognises one response encoding of a generated image
pub trait ShapeDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the object is not in this detector's shape
    fn detect(&self, object: &Value) -> Option<ImageSource>;
}

/// `uri` / `url` handles, including inline `data:` URIs
pub struct HandleDetector;

impl ShapeDetector for HandleDetector {
    fn name(&self) -> &'static str {
        "handle"
    }

    fn detect(&self, object: &Value) -> Option<ImageSource> {
        let handle = ["uri", "url"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))?
            .trim();

        if let Some(data) = handle.strip_prefix("data:") {
            let (_, payload) = data.split_once(";base64,")?;
            return STANDARD.decode(payload).ok().map(ImageSource::Bytes);
        }
        if handle.starts_with("http://") || handle.starts_with("https://") {
            return Some(ImageSource::Url(handle.to_string()));
        }
        None
    }
}

/// Raw bytes serialized as an array of numbers
pub struct RawBytesDetector;

impl ShapeDetector for RawBytesDetector {
    fn name(&self) -> &'static str {
        "raw bytes"
    }

    fn detect(&self, object: &Value) -> Option<ImageSource> {
        let values = ["imageBytes", "image_bytes"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))?;

        values
            .iter()
            .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect::<Option<Vec<u8>>>()
            .filter(|bytes| !bytes.is_empty())
            .map(ImageSource::Bytes)
    }
}

/// Base64 text under any of the field names providers use for it
pub struct Base64Detector;

impl ShapeDetector for Base64Detector {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn detect(&self, object: &Value) -> Option<ImageSource> {
        ["bytesBase64Encoded", "b64_json", "imageBytes", "image_bytes"]
            .iter()
            .filter_map(|key| object.get(*key).and_then(Value::as_str))
            .find_map(|text| STANDARD.decode(text.trim()).ok())
            .filter(|bytes| !bytes.is_empty())
            .map(ImageSource::Bytes)
    }
}

/// Detectors in priority order
const DETECTORS: [&dyn ShapeDetector; 3] = [&HandleDetector, &RawBytesDetector, &Base64Detector];

/// Find the image in a generated-image object
pub fn normalize(object: &Value) -> Result<ImageSource, GenerationError> {
    for detector in DETECTORS {
        if let Some(source) = detector.detect(object) {
            debug!("Image response matched the {} shape", detector.name());
            return Ok(source);
        }
    }
    Err(GenerationError::UnexpectedResponse(
        "No image data in response".to_string(),
    ))
}

/// First object found under any of `pointers`
fn first_image_object<'a>(
    response: &'a Value,
    pointers: &[&str],
) -> Result<&'a Value, GenerationError> {
    pointers
        .iter()
        .find_map(|pointer| response.pointer(pointer).filter(|v| v.is_object()))
        .ok_or_else(|| GenerationError::UnexpectedResponse("Response contains no images".to_string()))
}

async fn resolve(http: &HttpClient, object: &Value) -> Result<Vec<u8>, GenerationError> {
    match normalize(object)? {
        ImageSource::Bytes(bytes) => Ok(bytes),
        ImageSource::Url(url) => {
            debug!("Downloading generated image from {}", url);
            http.get_bytes(&url).await
        }
    }
}

/// A remote model that turns a prompt into one image
pub trait ImageProvider {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<Vec<u8>, GenerationError>> + Send;
}

/// Imagen through the Gemini API `predict` method
#[derive(Clone)]
pub struct ImagenProvider {
    http: HttpClient,
    model: String,
}

impl ImagenProvider {
    pub fn new(config: &ImageConfig) -> Result<Self, GenerationError> {
        let http = HttpClient::new(
            &config.endpoint,
            Credential::GoogApiKey(config.api_key.clone()),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(Self {
            http,
            model: config.model.clone(),
        })
    }
}

impl ImageProvider for ImagenProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let path = format!("v1beta/models/{}:predict", self.model);
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        });

        let response: Value = self.http.post(&path, &body).await?;
        let object = first_image_object(
            &response,
            &["/predictions/0", "/generatedImages/0/image", "/generatedImages/0"],
        )?;
        resolve(&self.http, object).await
    }
}

/// OpenAI-compatible `images/generations`
#[derive(Clone)]
pub struct OpenAiImageProvider {
    http: HttpClient,
    model: String,
}

impl OpenAiImageProvider {
    pub fn new(config: &ImageConfig) -> Result<Self, GenerationError> {
        let http = HttpClient::new(
            &config.endpoint,
            Credential::Bearer(config.api_key.clone()),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(Self {
            http,
            model: config.model.clone(),
        })
    }
}

impl ImageProvider for OpenAiImageProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
        });

        let response: Value = self.http.post("images/generations", &body).await?;
        let object = first_image_object(&response, &["/data/0"])?;
        resolve(&self.http, object).await
    }
}

/// The provider selected by configuration
#[derive(Clone)]
pub enum AnyImageProvider {
    Imagen(ImagenProvider),
    OpenAi(OpenAiImageProvider),
}

impl AnyImageProvider {
    pub fn from_config(config: &ImageConfig) -> Result<Self, GenerationError> {
        Ok(match config.backend {
            ImageBackend::Imagen => AnyImageProvider::Imagen(ImagenProvider::new(config)?),
            ImageBackend::OpenAi => AnyImageProvider::OpenAi(OpenAiImageProvider::new(config)?),
        })
    }
}

impl ImageProvider for AnyImageProvider {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        match self {
            AnyImageProvider::Imagen(provider) => provider.generate(prompt).await,
            AnyImageProvider::OpenAi(provider) => provider.generate(prompt).await,
        }
    }
}

/// Request one image; failures are logged and yield `None`
pub async fn request_image<P: ImageProvider>(provider: &P, prompt: &str) -> Option<GeneratedImage> {
    match provider.generate(prompt).await {
        Ok(bytes) if bytes.is_empty() => {
            warn!("Image provider returned no bytes");
            None
        }
        Ok(bytes) => {
            let image = GeneratedImage::new(bytes);
            info!("Generated {} image ({} bytes)", image.mime_type, image.bytes.len());
            Some(image)
        }
        Err(e) => {
            error!("Image generation failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    fn config(backend: ImageBackend, endpoint: String) -> ImageConfig {
        ImageConfig {
            backend,
            endpoint,
            model: "test-model".to_string(),
            api_key: "img-key".to_string(),
        }
    }

    #[test]
    fn test_mime_sniffing() {
        assert_eq!(GeneratedImage::new(PNG.to_vec()).mime_type, "image/png");
        let jpeg = GeneratedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(jpeg.mime_type, "image/jpeg");
        assert_eq!(jpeg.extension(), "jpg");
        let webp = GeneratedImage::new(b"RIFF\0\0\0\0WEBPVP8 ".to_vec());
        assert_eq!(webp.mime_type, "image/webp");
        assert_eq!(GeneratedImage::new(vec![1, 2]).mime_type, "image/png");
    }

    #[test]
    fn test_handle_takes_priority_over_bytes() {
        let object = json!({
            "url": "https://cdn.test/a.png",
            "b64_json": STANDARD.encode(PNG),
        });
        assert_eq!(
            normalize(&object).unwrap(),
            ImageSource::Url("https://cdn.test/a.png".to_string())
        );
    }

    #[test]
    fn test_data_uri_is_decoded_in_place() {
        let object = json!({ "uri": format!("data:image/png;base64,{}", STANDARD.encode(PNG)) });
        assert_eq!(normalize(&object).unwrap(), ImageSource::Bytes(PNG.to_vec()));
    }

    #[test]
    fn test_raw_bytes_before_base64() {
        let object = json!({ "imageBytes": PNG });
        assert_eq!(normalize(&object).unwrap(), ImageSource::Bytes(PNG.to_vec()));

        let object = json!({ "imageBytes": STANDARD.encode(PNG) });
        assert_eq!(normalize(&object).unwrap(), ImageSource::Bytes(PNG.to_vec()));
    }

    #[test]
    fn test_unrecognised_shape_is_an_error() {
        let object = json!({ "mimeType": "image/png", "url": "ftp://x" });
        assert!(matches!(
            normalize(&object),
            Err(GenerationError::UnexpectedResponse(_))
        ));
        assert!(normalize(&json!({ "imageBytes": [1, 999] })).is_err());
    }

    #[tokio::test]
    async fn test_imagen_predict_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/test-model:predict")
            .match_header("x-goog-api-key", "img-key")
            .match_body(Matcher::PartialJson(json!({
                "instances": [{ "prompt": "a robot" }],
                "parameters": { "sampleCount": 1 },
            })))
            .with_status(200)
            .with_body(
                json!({
                    "predictions": [{
                        "mimeType": "image/png",
                        "bytesBase64Encoded": STANDARD.encode(PNG),
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = ImagenProvider::new(&config(ImageBackend::Imagen, server.url())).unwrap();
        assert_eq!(provider.generate("a robot").await.unwrap(), PNG.to_vec());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_url_response_is_downloaded() {
        let mut server = Server::new_async().await;
        let image_url = format!("{}/files/img.png", server.url());
        let generation = server
            .mock("POST", "/images/generations")
            .match_header("authorization", "Bearer img-key")
            .match_body(Matcher::PartialJson(json!({ "model": "test-model", "n": 1 })))
            .with_status(200)
            .with_body(json!({ "data": [{ "url": image_url }] }).to_string())
            .create_async()
            .await;
        let download = server
            .mock("GET", "/files/img.png")
            .with_status(200)
            .with_body(PNG)
            .create_async()
            .await;

        let provider =
            AnyImageProvider::from_config(&config(ImageBackend::OpenAi, server.url())).unwrap();
        let image = request_image(&provider, "a robot").await.unwrap();
        assert_eq!(image.bytes, PNG.to_vec());
        assert_eq!(image.mime_type, "image/png");

        generation.assert_async().await;
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_image_swallows_failures() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/images/generations")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let provider = OpenAiImageProvider::new(&config(ImageBackend::OpenAi, server.url())).unwrap();
        assert!(request_image(&provider, "a robot").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_prediction_list_yields_none() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/test-model:predict")
            .with_status(200)
            .with_body("{\"predictions\": []}")
            .create_async()
            .await;

        let provider = ImagenProvider::new(&config(ImageBackend::Imagen, server.url())).unwrap();
        assert!(matches!(
            provider.generate("x").await,
            Err(GenerationError::UnexpectedResponse(_))
        ));
        assert!(request_image(&provider, "x").await.is_none());
    }
}
