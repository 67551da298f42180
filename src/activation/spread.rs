//! Spreading activation over a graph view

use super::types::ActivationMap;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Propagation parameters.
///
/// Each hop, every node scoring above `threshold` pushes
/// `score * decay * weight` to its neighbours. A neighbour keeps the larger
/// of its current score and the best push it received that hop, so scores
/// never decrease and the strongest path wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadingActivation {
    pub hops: usize,
    pub decay: f64,
    pub threshold: f64,
}

impl Default for SpreadingActivation {
    fn default() -> Self {
        Self {
            hops: 2,
            decay: 0.5,
            threshold: 0.01,
        }
    }
}

impl SpreadingActivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Normalize `seeds` by their maximum and spread them through `graph`.
    ///
    /// Seeds that are not nodes of the graph keep their score but do not
    /// propagate. Empty seeds give an empty map.
    pub fn activate(&self, graph: &Graph, seeds: &ActivationMap) -> ActivationMap {
        if seeds.is_empty() {
            return ActivationMap::new();
        }
        let mut scores = seeds.clone().normalized();
        let adj = graph.adjacency();

        for hop in 0..self.hops {
            let mut pushed = ActivationMap::new();
            for (id, score) in scores.iter() {
                if score <= self.threshold {
                    continue;
                }
                let Some(i) = graph.index_of(id) else {
                    continue;
                };
                for &(j, w) in adj.neighbors(i) {
                    pushed.raise(graph.nodes()[j].id.clone(), score * self.decay * w);
                }
            }
            if pushed.is_empty() {
                break;
            }
            for (id, score) in pushed.iter() {
                scores.raise(id.clone(), score);
            }
            debug!(hop = hop + 1, active = scores.len(), "activation spread");
        }

        scores
    }
}
