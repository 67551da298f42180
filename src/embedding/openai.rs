//! OpenAI-compatible `/embeddings` client

use super::{Embedder, EmbeddingError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Embedder that calls an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from an API key held in the environment variable `key_env`.
    pub fn from_env(
        base_url: impl Into<String>,
        model: impl Into<String>,
        key_env: &str,
    ) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EmbeddingError::Unavailable(format!("{} is not set", key_env)))?;
        Ok(Self::new(base_url, model, api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|err| EmbeddingError::Request(format!("provider request failed: {}", err)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| EmbeddingError::Request(format!("provider response read failed: {}", err)))?;

        if !status.is_success() {
            return Err(EmbeddingError::Request(format!(
                "provider request failed ({}): {}",
                status, body_text
            )));
        }

        parse_embeddings_response(&body_text, texts.len())
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Decode a response body, restoring input order from `index` when present.
fn parse_embeddings_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut parsed: EmbeddingsResponse = serde_json::from_str(body)
        .map_err(|err| EmbeddingError::Request(format!("provider response parse failed: {}", err)))?;

    if parsed.data.is_empty() {
        return Err(EmbeddingError::EmptyResult);
    }
    if parsed.data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            got: parsed.data.len(),
        });
    }
    if parsed.data.iter().all(|d| d.index.is_some()) {
        parsed.data.sort_by_key(|d| d.index);
    }
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}
