//! Usability gate for single-view retrieval

use super::stats::TopologyStats;
use serde::{Deserialize, Serialize};

/// Thresholds a view must meet to be used on its own.
///
/// A view that fails is still valid; the verdict is advisory and fused
/// views may combine gate-failing inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Upper bound on the mean 1-hop reachability
    pub max_hop1_ratio: f64,
    /// Lower bound on the giant component's mean shortest path
    pub min_avg_path: f64,
    /// Lower bound on the giant component's share of nodes
    pub min_giant_ratio: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            max_hop1_ratio: 0.05,
            min_avg_path: 3.0,
            min_giant_ratio: 0.70,
        }
    }
}

impl GateThresholds {
    pub fn passes(&self, avg_hop1_ratio: f64, avg_path_length: f64, giant_ratio: f64) -> bool {
        avg_hop1_ratio <= self.max_hop1_ratio
            && avg_path_length >= self.min_avg_path
            && giant_ratio >= self.min_giant_ratio
    }

    /// Re-evaluate stored stats, e.g. after thresholds changed
    pub fn evaluate(&self, stats: &TopologyStats) -> bool {
        self.passes(stats.avg_hop1_ratio, stats.avg_path_length, stats.giant_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_threshold_can_fail_the_gate() {
        let gate = GateThresholds::default();
        assert!(gate.passes(0.05, 3.0, 0.70));
        assert!(!gate.passes(0.06, 4.0, 0.9));
        assert!(!gate.passes(0.01, 2.9, 0.9));
        assert!(!gate.passes(0.01, 4.0, 0.69));
    }

    #[test]
    fn undefined_path_fails() {
        assert!(!GateThresholds::default().passes(0.01, -1.0, 0.95));
    }
}
