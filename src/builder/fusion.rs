//! Fusion of k-NN and co-occurrence edge sets

use crate::graph::{round_weight, Edge, EdgeMethod, NodeId};
use std::collections::BTreeMap;

/// Default share of the k-NN signal in a fused weight
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Blend two edge sets: `alpha * knn + (1 - alpha) * cooc`, absent = 0.
pub fn fuse_edges(knn: &[Edge], cooc: &[Edge], alpha: f64) -> Vec<Edge> {
    let mut weights: BTreeMap<(NodeId, NodeId), (f64, f64)> = BTreeMap::new();
    for e in knn {
        weights.entry(e.key()).or_default().0 = e.weight;
    }
    for e in cooc {
        weights.entry(e.key()).or_default().1 = e.weight;
    }

    weights
        .into_iter()
        .filter_map(|((a, b), (k, c))| {
            let fused = round_weight(alpha * k + (1.0 - alpha) * c);
            if fused > 0.0 {
                Edge::new(a, b, fused, EdgeMethod::Fusion)
            } else {
                None
            }
        })
        .collect()
}
