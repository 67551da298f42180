//! Diagnostics for graphs carrying hub nodes
//!
//! Hubs are deliberately over-connected, so whole-graph averages hide what
//! happens to ordinary nodes. The report measures the two populations
//! separately.

use super::metrics::{connected_components, sampled_average_path};
use super::stats::{round_to, TopologyConfig};
use crate::graph::{Graph, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Per-hub connection summary produced by injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubDetail {
    pub id: NodeId,
    pub degree: usize,
    /// Highest similarity among the hub's attached nodes
    pub top_sim: f64,
    /// Lowest similarity among the hub's attached nodes, before the floor
    pub bottom_sim: f64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubReport {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub general_count: usize,
    pub general_avg_degree: f64,
    /// Mean general-node degree over the total node count
    pub general_avg_hop1: f64,
    /// Sampled mean path between general nodes
    pub general_avg_path: Option<f64>,
    pub hub_count: usize,
    pub hub_max_degree: usize,
    pub hub_avg_degree: f64,
    /// Sampled mean path over all nodes
    pub overall_avg_path: Option<f64>,
    pub giant_ratio: f64,
    #[serde(default)]
    pub hubs: Vec<HubDetail>,
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

impl HubReport {
    pub fn compute<F>(graph: &Graph, is_hub: F, config: &TopologyConfig) -> Self
    where
        F: Fn(&Node) -> bool,
    {
        let n = graph.node_count();
        let adj = graph.adjacency();

        let (hub_idx, general_idx): (Vec<usize>, Vec<usize>) =
            (0..n).partition(|&i| is_hub(&graph.nodes()[i]));
        let hub_degrees: Vec<usize> = hub_idx.iter().map(|&i| adj.degree(i)).collect();
        let general_degrees: Vec<usize> = general_idx.iter().map(|&i| adj.degree(i)).collect();
        let all_idx: Vec<usize> = (0..n).collect();

        let giant = connected_components(&adj).first().map(Vec::len).unwrap_or(0);
        let general_avg_degree = mean(&general_degrees);

        Self {
            total_nodes: n,
            total_edges: graph.edge_count(),
            general_count: general_idx.len(),
            general_avg_degree: round_to(general_avg_degree, 1),
            general_avg_hop1: if n > 0 { round_to(general_avg_degree / n as f64, 4) } else { 0.0 },
            general_avg_path: sampled_average_path(&adj, &general_idx, config.path_sample, config.seed)
                .map(|p| round_to(p, 2)),
            hub_count: hub_idx.len(),
            hub_max_degree: hub_degrees.iter().copied().max().unwrap_or(0),
            hub_avg_degree: round_to(mean(&hub_degrees), 1),
            overall_avg_path: sampled_average_path(&adj, &all_idx, config.path_sample, config.seed)
                .map(|p| round_to(p, 2)),
            giant_ratio: if n > 0 { round_to(giant as f64 / n as f64, 4) } else { 0.0 },
            hubs: Vec::new(),
        }
    }

    pub fn with_details(mut self, hubs: Vec<HubDetail>) -> Self {
        self.hubs = hubs;
        self
    }

    /// Human-readable multi-line report
    pub fn render(&self) -> String {
        let path = |p: Option<f64>| p.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string());
        let mut out = String::new();
        let _ = writeln!(out, "nodes: {} | edges: {}", self.total_nodes, self.total_edges);
        let _ = writeln!(out, "[general] count={}", self.general_count);
        let _ = writeln!(out, "  avg degree: {:.1}", self.general_avg_degree);
        let _ = writeln!(out, "  avg 1-hop: {:.2}%", self.general_avg_hop1 * 100.0);
        let _ = writeln!(out, "  avg path (general): {}", path(self.general_avg_path));
        let _ = writeln!(out, "  giant component: {:.1}%", self.giant_ratio * 100.0);
        let _ = writeln!(out, "[hubs] count={}", self.hub_count);
        let _ = writeln!(out, "  max degree: {}", self.hub_max_degree);
        let _ = writeln!(out, "  avg degree: {:.1}", self.hub_avg_degree);
        let _ = writeln!(out, "  avg path (overall): {}", path(self.overall_avg_path));
        for h in &self.hubs {
            let _ = writeln!(
                out,
                "  {} | degree={} | sim=[{:.4}~{:.4}] | {}",
                h.id, h.degree, h.bottom_sim, h.top_sim, h.content
            );
        }
        out
    }
}
