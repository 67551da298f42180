//! Seed selection
//!
//! Seeds are the nodes a query starts from. Scores returned here are raw;
//! `SpreadingActivation` normalizes them by their maximum before spreading.

use super::types::ActivationMap;
use crate::builder::top_k_indices;
use crate::embedding::cosine_similarity;
use crate::embedding::tfidf::query_similarities;
use crate::graph::Node;
use serde::Serialize;
use std::fmt;

/// Which signal produced the seeds of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    Keyword,
    Embedding,
    /// TF-IDF used because no query vector was available
    Tfidf,
    /// Neither keywords nor query text were given
    Empty,
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeedSource::Keyword => "keyword",
            SeedSource::Embedding => "embedding",
            SeedSource::Tfidf => "tfidf",
            SeedSource::Empty => "empty",
        })
    }
}

/// Score = number of `keywords` found (case-insensitive substring) in the
/// node's content and keywords. Nodes matching none are not seeded.
pub fn keyword_seeds<S: AsRef<str>>(nodes: &[Node], keywords: &[S]) -> ActivationMap {
    let needles: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if needles.is_empty() {
        return ActivationMap::new();
    }

    nodes
        .iter()
        .filter_map(|node| {
            let haystack = node.searchable_text().to_lowercase();
            let hits = needles.iter().filter(|k| haystack.contains(k.as_str())).count();
            (hits > 0).then(|| (node.id.clone(), hits as f64))
        })
        .collect()
}

/// Top-`k` nodes by cosine similarity to the query vector.
///
/// `embeddings` is aligned with `nodes`. Non-positive similarities are
/// not seeded.
pub fn embedding_seeds(query: &[f32], nodes: &[Node], embeddings: &[Vec<f32>], k: usize) -> ActivationMap {
    let n = nodes.len().min(embeddings.len());
    let sims: Vec<f64> = embeddings[..n].iter().map(|e| cosine_similarity(query, e)).collect();
    top_seeds(nodes, &sims, k)
}

/// Top-`k` nodes by TF-IDF similarity between `query` and node content.
pub fn tfidf_seeds(query: &str, nodes: &[Node], k: usize) -> ActivationMap {
    let contents: Vec<&str> = nodes.iter().map(|n| n.content.as_str()).collect();
    let sims = query_similarities(query, &contents);
    top_seeds(nodes, &sims, k)
}

fn top_seeds(nodes: &[Node], sims: &[f64], k: usize) -> ActivationMap {
    top_k_indices(sims, k, None)
        .into_iter()
        .filter(|&i| sims[i] > 0.0)
        .map(|i| (nodes[i].id.clone(), sims[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, NodeType};

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("n0001", "Tuned search latency", NodeType::Fact).with_keywords(["perf"]),
            Node::new("n0002", "Bought green tea", NodeType::Fact),
            Node::new("n0003", "Latency budget for search", NodeType::Intention),
        ]
    }

    #[test]
    fn keyword_score_counts_matching_keywords() {
        let seeds = keyword_seeds(&nodes(), &["LATENCY", "perf", "search"]);
        assert_eq!(seeds.get(&NodeId::from("n0001")), 3.0);
        assert_eq!(seeds.get(&NodeId::from("n0003")), 2.0);
        assert!(!seeds.contains(&NodeId::from("n0002")));
    }

    #[test]
    fn blank_keywords_seed_nothing() {
        assert!(keyword_seeds(&nodes(), &["  "]).is_empty());
    }

    #[test]
    fn embedding_seeds_take_top_k_positive() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
        let seeds = embedding_seeds(&[1.0, 0.0], &nodes(), &embeddings, 3);
        assert_eq!(seeds.len(), 2);
        assert!((seeds.get(&NodeId::from("n0001")) - 1.0).abs() < 1e-9);
        assert!(!seeds.contains(&NodeId::from("n0002")));
    }

    #[test]
    fn embedding_seeds_respect_k() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.7, 0.7]];
        let seeds = embedding_seeds(&[1.0, 0.0], &nodes(), &embeddings, 1);
        assert_eq!(seeds.len(), 1);
        assert!(seeds.contains(&NodeId::from("n0001")));
    }

    #[test]
    fn tfidf_seeds_prefer_textual_overlap() {
        let seeds = tfidf_seeds("search latency", &nodes(), 1);
        let (top, _) = seeds.ranked().into_iter().next().unwrap();
        assert_ne!(top.as_str(), "n0002");
    }
}
