//! Text embedding providers
//!
//! Embeddings come from an `Embedder`: an OpenAI-compatible HTTP endpoint
//! in production, a local fastembed model behind the `embeddings` feature,
//! or a deterministic mock in tests. Every provider failure is an
//! `EmbeddingError` value; the query path treats it as a signal to fall
//! back to TF-IDF seeding rather than as a fatal error.

mod openai;
pub mod tfidf;

pub use openai::OpenAiEmbedder;

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from embedding providers
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding model error: {0}")]
    ModelError(String),

    #[error("embedding returned no results")]
    EmptyResult,

    #[error("expected {expected} embeddings, provider returned {got}")]
    CountMismatch { expected: usize, got: usize },
}

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyResult)
    }
}

/// Embed `texts` in sequential batches, pausing `delay` between requests.
///
/// Fails as a whole if any batch fails; callers never see a partial table.
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    delay: Duration,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut out = Vec::with_capacity(texts.len());

    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        let vectors = embedder.embed_batch(&refs).await?;
        if vectors.len() != chunk.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: chunk.len(),
                got: vectors.len(),
            });
        }
        out.extend(vectors);
        debug!(batch = i + 1, total_batches, embedded = out.len(), "embedding batch done");

        if i + 1 < total_batches && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(count = out.len(), "embedded texts");
    Ok(out)
}

/// Cosine similarity in f64; a zero-norm vector is treated as norm 1.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    dot / (norm_or_one(a) * norm_or_one(b))
}

/// L2 norm, with 0 mapped to 1 so that zero vectors stay zero after division
pub fn norm_or_one(v: &[f32]) -> f64 {
    let n = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if n == 0.0 {
        1.0
    } else {
        n
    }
}

// ---------------------------------------------------------------------------
// FastEmbedEmbedder: local embedder behind the `embeddings` feature
// ---------------------------------------------------------------------------

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::{Arc, Mutex};

    /// Local embedder backed by fastembed (ONNX Runtime).
    ///
    /// `TextEmbedding::embed` takes `&mut self` and blocks for the whole
    /// inference, so each batch runs on the blocking pool under a `Mutex`.
    pub struct FastEmbedEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
    }

    impl FastEmbedEmbedder {
        pub fn new(model: EmbeddingModel) -> Result<Self, EmbeddingError> {
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                model: Arc::new(Mutex::new(embedding)),
            })
        }

        /// Default model: nomic-embed-text-v1.5 (768 dims).
        pub fn default_model() -> Result<Self, EmbeddingError> {
            Self::new(EmbeddingModel::NomicEmbedTextV15)
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let model = Arc::clone(&self.model);
            let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

            let embeddings = tokio::task::spawn_blocking(move || {
                let mut model = model
                    .lock()
                    .map_err(|e| EmbeddingError::ModelError(format!("model lock poisoned: {}", e)))?;
                model
                    .embed(owned, None)
                    .map_err(|e| EmbeddingError::ModelError(e.to_string()))
            })
            .await
            .map_err(|e| EmbeddingError::ModelError(format!("embedding task failed: {}", e)))??;

            if embeddings.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(embeddings)
        }
    }

}
