use anyhow::Context;
use axum::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use tracing::debug;

use super::dto::{
    AnnotateImageRequest, AnnotateRequest, AnnotateResponse, ErrorBody, Feature, ImageContent,
};
use crate::config::VisionConfig;

#[async_trait]
pub trait LabelClient: Send + Sync {
    /// Label descriptions for the image, in the order the service ranks them.
    async fn detect_labels(&self, image: Bytes) -> anyhow::Result<Vec<String>>;
}

/// Google Cloud Vision `images:annotate` client using an API key.
#[derive(Clone)]
pub struct GoogleVisionClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GoogleVisionClient {
    pub fn new(http: reqwest::Client, config: &VisionConfig) -> Self {
        Self {
            http,
            url: format!("{}/images:annotate", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl LabelClient for GoogleVisionClient {
    async fn detect_labels(&self, image: Bytes) -> anyhow::Result<Vec<String>> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(&image),
                },
                features: vec![Feature {
                    feature_type: "LABEL_DETECTION",
                }],
            }],
        };

        let response = self
            .http
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("label detection request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            anyhow::bail!("label detection failed with {}: {}", status, message);
        }

        let annotated = response
            .json::<AnnotateResponse>()
            .await
            .context("decode label detection response")?;
        labels_from_response(annotated)
    }
}

fn labels_from_response(response: AnnotateResponse) -> anyhow::Result<Vec<String>> {
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(Vec::new());
    };
    if let Some(status) = first.error.filter(|s| !s.message.is_empty()) {
        anyhow::bail!("{}", status.message);
    }
    let labels: Vec<String> = first
        .label_annotations
        .into_iter()
        .map(|l| l.description)
        .collect();
    debug!(?labels, "labels detected");
    Ok(labels)
}
