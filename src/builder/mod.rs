//! Graph synthesis
//!
//! A *view* is one graph built over the memory node set with a given
//! method and neighbour count, e.g. `knn__k12` or `fusion__k8`. Builds are
//! always total: every call recomputes the edge set from the nodes.

mod cooccurrence;
mod fusion;
mod knn;
mod similarity;

pub use cooccurrence::{cooccurrence_edges, distance_weight, MAX_DISTANCE};
pub use fusion::{fuse_edges, DEFAULT_ALPHA};
pub use knn::{knn_edges, MUTUAL_BOOST};
pub use similarity::SimilarityMatrix;

pub(crate) use knn::top_k_indices;

use crate::graph::{Edge, Graph, GraphResult, Node};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while naming or selecting a build
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Unknown build method: {0}")]
    UnknownMethod(String),

    #[error("Invalid view name: {0} (expected e.g. knn__k12 or knn:12)")]
    InvalidView(String),
}

/// Edge synthesis method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMethod {
    Knn,
    Cooccurrence,
    Fusion,
}

impl BuildMethod {
    /// Short label used in view names
    pub fn label(&self) -> &'static str {
        match self {
            BuildMethod::Knn => "knn",
            BuildMethod::Cooccurrence => "cooc",
            BuildMethod::Fusion => "fusion",
        }
    }
}

impl FromStr for BuildMethod {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "knn" => Ok(BuildMethod::Knn),
            "cooc" | "cooccurrence" | "co-occurrence" => Ok(BuildMethod::Cooccurrence),
            "fusion" => Ok(BuildMethod::Fusion),
            other => Err(BuildError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for BuildMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named graph view: method and neighbour count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub method: BuildMethod,
    pub k: usize,
    /// k-NN share for fusion views; `None` means the builder default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

impl ViewSpec {
    pub fn new(method: BuildMethod, k: usize) -> Self {
        Self { method, k, alpha: None }
    }

    pub fn knn(k: usize) -> Self {
        Self::new(BuildMethod::Knn, k)
    }

    pub fn cooccurrence(k: usize) -> Self {
        Self::new(BuildMethod::Cooccurrence, k)
    }

    pub fn fusion(k: usize, alpha: f64) -> Self {
        Self {
            method: BuildMethod::Fusion,
            k,
            alpha: Some(alpha),
        }
    }

    /// Persisted name, e.g. `knn__k12`
    pub fn name(&self) -> String {
        format!("{}__k{}", self.method.label(), self.k)
    }
}

impl fmt::Display for ViewSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn view_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([A-Za-z-]+)(?:__k|:)([0-9]+)$").ok())
        .as_ref()
}

impl FromStr for ViewSpec {
    type Err = BuildError;

    /// Parses `knn__k12`, `cooc__k8`, `fusion:5`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = view_pattern()
            .and_then(|re| re.captures(s.trim()))
            .ok_or_else(|| BuildError::InvalidView(s.to_string()))?;
        let method: BuildMethod = caps[1].parse()?;
        let k: usize = caps[2].parse().map_err(|_| BuildError::InvalidView(s.to_string()))?;
        if k == 0 {
            return Err(BuildError::InvalidView(s.to_string()));
        }
        Ok(Self::new(method, k))
    }
}

/// Builds views over a fixed node set and similarity matrix.
///
/// The node slice and the matrix are aligned by position.
pub struct GraphBuilder<'a> {
    nodes: &'a [Node],
    similarity: &'a SimilarityMatrix,
    alpha: f64,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(nodes: &'a [Node], similarity: &'a SimilarityMatrix) -> Self {
        Self {
            nodes,
            similarity,
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Synthesize the edge list for a view.
    pub fn edges(&self, spec: &ViewSpec) -> Vec<Edge> {
        match spec.method {
            BuildMethod::Knn => knn_edges(self.nodes, spec.k, self.similarity),
            BuildMethod::Cooccurrence => cooccurrence_edges(self.nodes, spec.k),
            BuildMethod::Fusion => {
                let knn = knn_edges(self.nodes, spec.k, self.similarity);
                let cooc = cooccurrence_edges(self.nodes, spec.k);
                fuse_edges(&knn, &cooc, spec.alpha.unwrap_or(self.alpha))
            }
        }
    }

    /// Synthesize a view and assemble it into a graph.
    pub fn build(&self, spec: &ViewSpec) -> GraphResult<Graph> {
        Graph::from_parts(self.nodes.to_vec(), self.edges(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, NodeType};

    #[test]
    fn view_names_parse_in_both_forms() {
        assert_eq!("knn__k12".parse::<ViewSpec>().unwrap(), ViewSpec::knn(12));
        assert_eq!("cooc:8".parse::<ViewSpec>().unwrap(), ViewSpec::cooccurrence(8));
        assert_eq!("fusion__k5".parse::<ViewSpec>().unwrap().method, BuildMethod::Fusion);
        assert_eq!(ViewSpec::cooccurrence(8).name(), "cooc__k8");
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert_eq!(
            "pagerank__k3".parse::<ViewSpec>().unwrap_err(),
            BuildError::UnknownMethod("pagerank".to_string())
        );
        assert!(matches!("knn".parse::<ViewSpec>(), Err(BuildError::InvalidView(_))));
        assert!(matches!("knn__k0".parse::<ViewSpec>(), Err(BuildError::InvalidView(_))));
    }

    #[test]
    fn fusion_view_carries_both_signals() {
        let nodes: Vec<Node> = (1..=3)
            .map(|i| {
                Node::new(NodeId::from_sequence(i), format!("m{}", i), NodeType::Fact).with_session("s1")
            })
            .collect();
        let sim = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.8],
            vec![0.0, 1.0, 0.0],
            vec![0.8, 0.0, 1.0],
        ]);
        let graph = GraphBuilder::new(&nodes, &sim).build(&ViewSpec::fusion(2, 0.6)).unwrap();

        // n1-n3: knn 0.96 (mutual) and cooc 0.5 (distance 2)
        let w13 = graph.edge_weight(&NodeId::from_sequence(1), &NodeId::from_sequence(3)).unwrap();
        assert!((w13 - (0.6 * 0.96 + 0.4 * 0.5)).abs() < 1e-4);
        // n1-n2: cooc only
        let w12 = graph.edge_weight(&NodeId::from_sequence(1), &NodeId::from_sequence(2)).unwrap();
        assert!((w12 - 0.4 * 0.6667).abs() < 1e-4);
    }
}
