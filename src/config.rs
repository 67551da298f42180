//! Configuration loaded from YAML
//!
//! Every section has defaults, so an empty or missing file is a valid
//! configuration.

use crate::activation::{FusionConfig, SpreadingActivation};
use crate::builder::{ViewSpec, DEFAULT_ALPHA};
use crate::embedding::{Embedder, EmbeddingError, OpenAiEmbedder};
use crate::hub::HubConfig;
use crate::topology::{GateThresholds, TopologyConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Which embedding backend the engine uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    OpenAi,
    FastEmbed,
    /// No provider; queries fall back to TF-IDF seeding
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 100,
            batch_delay_ms: 100,
        }
    }
}

impl EmbeddingConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Construct the configured embedder. `Ok(None)` when the provider is
    /// `none`.
    pub fn embedder(&self) -> Result<Option<Box<dyn Embedder>>, EmbeddingError> {
        match self.provider {
            EmbeddingProvider::None => Ok(None),
            EmbeddingProvider::OpenAi => Ok(Some(Box::new(OpenAiEmbedder::from_env(
                self.base_url.clone(),
                self.model.clone(),
                &self.api_key_env,
            )?))),
            #[cfg(feature = "embeddings")]
            EmbeddingProvider::FastEmbed => Ok(Some(Box::new(
                crate::embedding::FastEmbedEmbedder::default_model()?,
            ))),
            #[cfg(not(feature = "embeddings"))]
            EmbeddingProvider::FastEmbed => Err(EmbeddingError::Unavailable(
                "built without the `embeddings` feature".to_string(),
            )),
        }
    }
}

/// Similarity used to build k-NN views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilaritySource {
    #[default]
    Embedding,
    Tfidf,
}

impl std::str::FromStr for SimilaritySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "embedding" | "embeddings" => Ok(SimilaritySource::Embedding),
            "tfidf" | "tf-idf" => Ok(SimilaritySource::Tfidf),
            other => Err(format!("unknown similarity source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// View used for hub injection and as the default query view
    pub primary_view: String,
    pub alpha: f64,
    pub similarity: SimilaritySource,
    /// Document-frequency cutoff for TF-IDF built views
    pub tfidf_max_df: f64,
    /// k values tried by `sweep`
    pub sweep_k: Vec<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            primary_view: ViewSpec::knn(12).name(),
            alpha: DEFAULT_ALPHA,
            similarity: SimilaritySource::default(),
            tfidf_max_df: 0.95,
            sweep_k: vec![5, 8, 12, 16],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Seed nodes taken from the query
    pub seeds: usize,
    #[serde(flatten)]
    pub spread: SpreadingActivation,
    /// Results returned
    pub top_n: usize,
    #[serde(flatten)]
    pub fusion: FusionConfig,
    /// Views queried; empty means the primary view only
    pub views: Vec<String>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            seeds: 3,
            spread: SpreadingActivation::default(),
            top_n: 15,
            fusion: FusionConfig::default(),
            views: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemnetConfig {
    /// Overrides the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub embedding: EmbeddingConfig,
    pub graph: GraphConfig,
    pub activation: ActivationConfig,
    pub gate: GateThresholds,
    pub topology: TopologyConfig,
    pub hub: HubConfig,
}

impl MemnetConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Load `path` if given, else the default path if it exists, else
    /// defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) if p.is_file() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config_dir>/memnet/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("memnet").join("config.yaml"))
    }

    /// Data directory: the configured one, else `<data_dir>/memnet`
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
                .join("memnet")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::FusionKind;

    #[test]
    fn empty_file_gives_defaults() {
        let config = MemnetConfig::from_yaml("").unwrap();
        assert_eq!(config, MemnetConfig::default());
        assert_eq!(config.graph.primary_view, "knn__k12");
        assert_eq!(config.activation.seeds, 3);
        assert_eq!(config.activation.spread.hops, 2);
        assert_eq!(config.hub.hub_k, 100);
        assert_eq!(config.hub.definitions.len(), 12);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
embedding:
  provider: none
activation:
  hops: 3
  fusion: weighted
  views: [knn__k12, cooc__k8]
gate:
  min_avg_path: 2.5
"#;
        let config = MemnetConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::None);
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.activation.spread.hops, 3);
        assert_eq!(config.activation.spread.decay, 0.5);
        assert_eq!(config.activation.fusion.kind, FusionKind::Weighted);
        assert_eq!(config.activation.views.len(), 2);
        assert_eq!(config.gate.min_avg_path, 2.5);
        assert_eq!(config.gate.min_giant_ratio, 0.70);
    }

    #[test]
    fn hub_definitions_can_be_overridden() {
        let yaml = r#"
hub:
  hub_k: 20
  definitions:
    - content: "I keep answers short"
      type: intention
      context_hint: conduct
"#;
        let config = MemnetConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.hub.hub_k, 20);
        assert_eq!(config.hub.session, "identity");
        assert_eq!(config.hub.definitions.len(), 1);
    }

    #[test]
    fn unknown_fusion_is_an_error() {
        assert!(MemnetConfig::from_yaml("activation:\n  fusion: max\n").is_err());
    }

    #[test]
    fn no_provider_means_no_embedder() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::None,
            ..EmbeddingConfig::default()
        };
        assert!(config.embedder().unwrap().is_none());
    }
}
