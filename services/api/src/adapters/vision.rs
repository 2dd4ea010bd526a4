//! services/api/src/adapters/vision.rs
//!
//! This module contains the adapter for the Cloud Vision label-detection API.
//! It implements the `LabelDetectionService` port from the `core` crate.

use crate::config::VisionConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pantry_core::domain::Label;
use pantry_core::ports::{LabelDetectionService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

//=========================================================================================
// Wire Types (images:annotate)
//=========================================================================================

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    error: Option<StatusBody>,
}

#[derive(Deserialize)]
struct LabelAnnotation {
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Deserialize)]
struct StatusBody {
    #[serde(default)]
    message: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LabelDetectionService` over the Vision REST API.
#[derive(Clone)]
pub struct VisionAdapter {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: u32,
}

impl VisionAdapter {
    /// Creates a new `VisionAdapter`. The HTTP client is built once and reused
    /// for every request.
    pub fn new(config: &VisionConfig) -> PortResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }
}

//=========================================================================================
// `LabelDetectionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LabelDetectionService for VisionAdapter {
    async fn detect_labels(&self, image: &[u8]) -> PortResult<Vec<Label>> {
        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: [Feature {
                    kind: "LABEL_DETECTION",
                    max_results: self.max_results,
                }],
            }],
        };
        let url = format!("{}/v1/images:annotate", self.endpoint);

        debug!(url = %url, bytes = image.len(), "Submitting image for label detection");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Label detection failed with {}: {}",
                status, error_text
            )));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let first = parsed.responses.into_iter().next().ok_or_else(|| {
            PortError::Unexpected("Label detection returned no responses.".to_string())
        })?;

        if let Some(error) = first.error {
            return Err(PortError::Unexpected(format!(
                "Label detection rejected the image: {}",
                error.message
            )));
        }

        Ok(first
            .label_annotations
            .into_iter()
            .map(|a| Label {
                description: a.description,
                confidence: a.score,
            })
            .collect())
    }
}
