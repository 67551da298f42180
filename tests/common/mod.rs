//! Common fixtures for memnet integration tests
//!
//! A small two-session corpus, a deterministic bag-of-words embedder, and
//! helpers for opening an engine over a temporary directory.

#![allow(dead_code)]

use async_trait::async_trait;
use memnet::{
    Embedder, EmbeddingError, JsonFileStore, MemnetConfig, MemoryEngine, Node, NodeType, OpenStore,
};
use std::sync::Arc;
use tempfile::TempDir;

pub const VOCAB: &[&str] = &[
    "rust", "graph", "search", "latency", "index", "tea", "coffee", "morning", "walk", "partner", "review",
];

/// Dimension `i` counts occurrences of `VOCAB[i]` in the lowercased text.
pub struct BagOfWords;

#[async_trait]
impl Embedder for BagOfWords {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                VOCAB.iter().map(|w| lower.matches(*w).count() as f32).collect()
            })
            .collect())
    }
}

/// Provider that is always down
pub struct Offline;

#[async_trait]
impl Embedder for Offline {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("offline".to_string()))
    }
}

pub fn corpus() -> Vec<Node> {
    let work = [
        ("rust graph index for search", NodeType::Fact),
        ("search latency regressed after the index change", NodeType::Fact),
        ("profile graph walk latency in rust", NodeType::Intention),
        ("rust search service owns the index", NodeType::Fact),
        ("review the graph index with my partner", NodeType::Intention),
        ("search latency budget is 50ms", NodeType::Fact),
    ];
    let home = [
        ("green tea every morning", NodeType::Fact),
        ("coffee only after the morning walk", NodeType::Fact),
        ("long walk with tea on weekends", NodeType::Fact),
        ("prefers tea over coffee", NodeType::Intention),
    ];
    let mut nodes = Vec::new();
    let mut seq = 1;
    for (content, ty) in work {
        nodes.push(Node::new(format!("n{:04}", seq), content, ty).with_session("2026-03-01-s1"));
        seq += 1;
    }
    for (content, ty) in home {
        nodes.push(Node::new(format!("n{:04}", seq), content, ty).with_session("2026-03-02-s2"));
        seq += 1;
    }
    nodes
}

/// Engine over a temp directory seeded with the corpus (no embeddings yet)
pub fn engine_with(config: MemnetConfig, embedder: Arc<dyn Embedder>) -> (TempDir, MemoryEngine) {
    let dir = TempDir::new().expect("temp dir");
    let store = JsonFileStore::open(dir.path()).expect("open store");
    memnet::NetworkStore::save_nodes(&store, &corpus()).expect("seed nodes");
    let engine = MemoryEngine::new(Arc::new(store), config).with_embedder(embedder);
    (dir, engine)
}

/// Engine with embeddings computed by `BagOfWords`
pub async fn embedded_engine(config: MemnetConfig) -> (TempDir, MemoryEngine) {
    let (dir, engine) = engine_with(config, Arc::new(BagOfWords));
    engine.rebuild_embeddings().await.expect("embed corpus");
    (dir, engine)
}
