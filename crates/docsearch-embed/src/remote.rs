//! Tier 1: hosted embedding API (Gemini `embedContent` wire format).
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::EmbedError;
use crate::EmbedTier;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct RemoteTier {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
}

impl RemoteTier {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        dim: usize,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() || api_key == "disabled" {
            return Err(EmbedError::Disabled("no remote api key"));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            dim,
        })
    }

    fn endpoint(&self) -> String { format!("{}/models/{}:embedContent", self.base_url, self.model) }
}

#[async_trait]
impl EmbedTier for RemoteTier {
    fn name(&self) -> &'static str { "remote" }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content { parts: vec![Part { text }] },
            output_dimensionality: self.dim,
        };
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbedContentResponse>()
            .await?;

        let values = response.embedding.values;
        debug!(dims = values.len(), model = %self.model, "remote embedding received");
        if values.is_empty() {
            return Err(EmbedError::InvalidResponse("empty embedding".to_string()));
        }
        if values.len() != self.dim {
            return Err(EmbedError::DimensionMismatch { expected: self.dim, actual: values.len() });
        }
        Ok(values)
    }
}
