//! Topology statistics for one graph view

use super::gate::GateThresholds;
use super::metrics::{
    average_clustering, average_shortest_path, connected_components, sampled_average_path,
};
use crate::builder::ViewSpec;
use crate::graph::{Graph, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sampling parameters for topology measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Nodes (in graph order) used for the 1-hop reachability average
    pub hop1_sample: usize,
    /// Largest giant component measured with exact all-pairs BFS
    pub exact_path_limit: usize,
    /// BFS sources drawn when the giant component exceeds the exact limit
    pub path_sample: usize,
    pub seed: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            hop1_sample: 30,
            exact_path_limit: 1500,
            path_sample: 200,
            seed: 42,
        }
    }
}

/// A high-degree node listed in the stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEntry {
    pub id: NodeId,
    pub degree: usize,
    /// First 60 characters of the node content
    pub content: String,
}

/// Measured topology of a graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyStats {
    #[serde(flatten)]
    pub view: Option<ViewSpec>,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_degree: f64,
    pub num_components: usize,
    pub giant_ratio: f64,
    pub avg_hop1_ratio: f64,
    /// Mean shortest path in the giant component, -1 when the giant
    /// component holds half the nodes or fewer
    pub avg_path_length: f64,
    pub clustering_coeff: f64,
    pub density: f64,
    #[serde(rename = "hub_nodes", default)]
    pub top_hubs: Vec<HubEntry>,
    pub gate_pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

/// Number of highest-degree nodes listed in the stats
pub const TOP_HUBS: usize = 5;

pub(crate) fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

pub(crate) fn preview(content: &str, chars: usize) -> String {
    content.chars().take(chars).collect()
}

impl TopologyStats {
    /// Measure `graph` and evaluate the gate.
    ///
    /// Values are rounded the way they are persisted (degree and path to 2
    /// decimals, ratios to 4) before the gate is applied.
    pub fn compute(graph: &Graph, config: &TopologyConfig, gate: &GateThresholds) -> Self {
        let n = graph.node_count();
        let m = graph.edge_count();
        let adj = graph.adjacency();

        let avg_degree = if n > 0 { 2.0 * m as f64 / n as f64 } else { 0.0 };
        let density = if n > 1 {
            2.0 * m as f64 / (n as f64 * (n - 1) as f64)
        } else {
            0.0
        };

        let components = connected_components(&adj);
        let giant: &[usize] = components.first().map(Vec::as_slice).unwrap_or(&[]);
        let giant_ratio = if n > 0 { giant.len() as f64 / n as f64 } else { 0.0 };

        let hop1_count = config.hop1_sample.min(n);
        let denom = n.saturating_sub(1).max(1) as f64;
        let avg_hop1 = if hop1_count > 0 {
            (0..hop1_count).map(|i| adj.degree(i) as f64 / denom).sum::<f64>() / hop1_count as f64
        } else {
            0.0
        };

        let avg_path = if giant_ratio > 0.5 {
            if giant.len() <= config.exact_path_limit {
                average_shortest_path(&adj, giant)
            } else {
                sampled_average_path(&adj, giant, config.path_sample, config.seed).unwrap_or(-1.0)
            }
        } else {
            -1.0
        };

        let mut by_degree: Vec<usize> = (0..n).collect();
        by_degree.sort_by(|&a, &b| adj.degree(b).cmp(&adj.degree(a)).then(a.cmp(&b)));
        let top_hubs = by_degree
            .into_iter()
            .take(TOP_HUBS)
            .map(|i| {
                let node = &graph.nodes()[i];
                HubEntry {
                    id: node.id.clone(),
                    degree: adj.degree(i),
                    content: preview(&node.content, 60),
                }
            })
            .collect();

        let avg_hop1_ratio = round_to(avg_hop1, 4);
        let avg_path_length = if avg_path < 0.0 { -1.0 } else { round_to(avg_path, 2) };
        let giant_ratio = round_to(giant_ratio, 4);

        Self {
            view: None,
            num_nodes: n,
            num_edges: m,
            avg_degree: round_to(avg_degree, 2),
            num_components: components.len(),
            giant_ratio,
            avg_hop1_ratio,
            avg_path_length,
            clustering_coeff: round_to(average_clustering(&adj), 4),
            density: round_to(density, 4),
            top_hubs,
            gate_pass: gate.passes(avg_hop1_ratio, avg_path_length, giant_ratio),
            built_at: None,
        }
    }

    pub fn with_view(mut self, view: ViewSpec) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_built_at(mut self, at: DateTime<Utc>) -> Self {
        self.built_at = Some(at);
        self
    }

    /// One-line summary, e.g. for sweep output
    pub fn summary_line(&self) -> String {
        let label = self.view.map(|v| v.name()).unwrap_or_else(|| "graph".to_string());
        format!(
            "{:<12} edges={:>5} avg_deg={:>6.2} hop1={:.3} path={:>5.2} giant={:.2} clust={:.3} [{}]",
            label,
            self.num_edges,
            self.avg_degree,
            self.avg_hop1_ratio,
            self.avg_path_length,
            self.giant_ratio,
            self.clustering_coeff,
            if self.gate_pass { "PASS" } else { "FAIL" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeMethod, Node, NodeType};

    fn ring(n: u32, extra_isolated: u32) -> Graph {
        let nodes = (1..=n + extra_isolated)
            .map(|i| Node::new(NodeId::from_sequence(i), format!("node {}", i), NodeType::Fact))
            .collect();
        let edges = (1..=n)
            .filter_map(|i| {
                let j = if i == n { 1 } else { i + 1 };
                Edge::new(NodeId::from_sequence(i), NodeId::from_sequence(j), 0.5, EdgeMethod::Knn)
            })
            .collect();
        Graph::from_parts(nodes, edges).unwrap()
    }

    #[test]
    fn large_ring_passes_gate() {
        // ring of 60: degree 2, hop1 = 2/59 ≈ 0.034, path ≈ 15
        let stats = TopologyStats::compute(&ring(60, 0), &TopologyConfig::default(), &GateThresholds::default());
        assert_eq!(stats.num_components, 1);
        assert_eq!(stats.giant_ratio, 1.0);
        assert_eq!(stats.avg_degree, 2.0);
        assert!(stats.avg_path_length > 3.0);
        assert_eq!(stats.clustering_coeff, 0.0);
        assert!(stats.gate_pass);
    }

    #[test]
    fn fragmented_graph_fails_gate_on_giant_ratio() {
        // 40-node ring plus 20 isolated nodes: giant = 40/60 < 0.70
        let stats = TopologyStats::compute(&ring(40, 20), &TopologyConfig::default(), &GateThresholds::default());
        assert_eq!(stats.num_components, 21);
        assert!(stats.giant_ratio < 0.70);
        assert!(stats.avg_path_length > 3.0);
        assert!(!stats.gate_pass);
    }

    #[test]
    fn path_is_undefined_when_giant_is_half_or_less() {
        let stats = TopologyStats::compute(&ring(5, 5), &TopologyConfig::default(), &GateThresholds::default());
        assert_eq!(stats.giant_ratio, 0.5);
        assert_eq!(stats.avg_path_length, -1.0);
    }

    #[test]
    fn sampled_path_is_used_above_exact_limit() {
        let config = TopologyConfig {
            exact_path_limit: 10,
            path_sample: 20,
            ..TopologyConfig::default()
        };
        let stats = TopologyStats::compute(&ring(50, 0), &config, &GateThresholds::default());
        assert!(stats.avg_path_length > 3.0);
    }

    #[test]
    fn stats_serialize_with_view_label() {
        let stats = TopologyStats::compute(&ring(4, 0), &TopologyConfig::default(), &GateThresholds::default())
            .with_view(ViewSpec::knn(12));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["method"], "knn");
        assert_eq!(json["k"], 12);
        assert_eq!(json["hub_nodes"].as_array().unwrap().len(), 4);

        let back: TopologyStats = serde_json::from_value(json).unwrap();
        assert_eq!(back.view, Some(ViewSpec::knn(12)));
    }

    #[test]
    fn empty_graph_has_zero_stats() {
        let stats = TopologyStats::compute(&Graph::default(), &TopologyConfig::default(), &GateThresholds::default());
        assert_eq!(stats.num_nodes, 0);
        assert_eq!(stats.avg_path_length, -1.0);
        assert!(!stats.gate_pass);
    }
}
