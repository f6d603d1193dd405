//! Google Vision text-detection client
//!
//! One `images:annotate` call per proof image, requesting TEXT_DETECTION.
//! The first annotation carries the full detected text; no annotations means
//! the service found no text, which is a successful empty detection.

use super::{DetectError, TextDetector};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shamba_common::config::VisionConfig;
use std::time::Duration;

/// Google Vision REST API client
pub struct GoogleVisionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResult {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct VisionStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl GoogleVisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self, DetectError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DetectError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextDetector for GoogleVisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<String, DetectError> {
        let url = format!("{}/v1/images:annotate", self.endpoint);
        let body = json!({
            "requests": [{
                "image": { "content": general_purpose::STANDARD.encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }],
            }]
        });

        tracing::debug!(bytes = image.len(), "Requesting text detection");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| DetectError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DetectError::Api(status.as_u16(), error_text));
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| DetectError::Parse(e.to_string()))?;

        let result = annotate
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| DetectError::Parse("no annotation result".to_string()))?;

        // Per-image failures arrive inside an HTTP 200 envelope
        if let Some(error) = result.error {
            return Err(DetectError::Api(
                error.code as u16,
                error.message,
            ));
        }

        // First annotation is the full text; none detected is not an error
        let text = result
            .text_annotations
            .into_iter()
            .next()
            .map(|annotation| annotation.description)
            .unwrap_or_default();

        tracing::debug!(chars = text.len(), "Text detection completed");

        Ok(text)
    }
}
