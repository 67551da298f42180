//! Weighted undirected edges between memory nodes

use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an edge was synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMethod {
    /// Embedding-space nearest neighbours
    Knn,
    /// Adjacency within a session
    Cooccurrence,
    /// Weighted blend of k-NN and co-occurrence
    Fusion,
    /// Hub node attached to its most similar memories
    HubKnn,
}

impl EdgeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMethod::Knn => "knn",
            EdgeMethod::Cooccurrence => "cooccurrence",
            EdgeMethod::Fusion => "fusion",
            EdgeMethod::HubKnn => "hub_knn",
        }
    }
}

impl fmt::Display for EdgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An undirected edge.
///
/// Endpoints are stored in canonical order (`source < target`) so that an
/// unordered pair has exactly one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub method: EdgeMethod,
}

impl Edge {
    /// Create an edge, swapping endpoints into canonical order.
    ///
    /// Returns `None` for self-loops.
    pub fn new(a: NodeId, b: NodeId, weight: f64, method: EdgeMethod) -> Option<Self> {
        if a == b {
            return None;
        }
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        Some(Self {
            source,
            target,
            weight,
            method,
        })
    }

    /// The unordered pair this edge connects
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.source.clone(), self.target.clone())
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint
    pub fn other(&self, id: &NodeId) -> Option<&NodeId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Round a weight to the persisted precision of four decimals.
pub fn round_weight(w: f64) -> f64 {
    (w * 10_000.0).round() / 10_000.0
}
