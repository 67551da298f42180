//! k-nearest-neighbour edge synthesis

use super::similarity::SimilarityMatrix;
use crate::graph::{round_weight, Edge, EdgeMethod, Node};
use std::collections::BTreeMap;

/// Weight multiplier for pairs chosen from both endpoints
pub const MUTUAL_BOOST: f64 = 1.2;

/// Indices of the `k` largest values of `row`, excluding `skip`.
///
/// Ties go to the lower index.
pub(crate) fn top_k_indices(row: &[f64], k: usize, skip: Option<usize>) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..row.len()).filter(|&j| Some(j) != skip).collect();
    idx.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b)));
    idx.truncate(k);
    idx
}

/// Connect each node to its `k` most similar peers.
///
/// Only positive similarities become candidates. A pair chosen from both
/// sides gets `max(w_ij, w_ji) * 1.2`, clamped to 1.0.
pub fn knn_edges(nodes: &[Node], k: usize, sim: &SimilarityMatrix) -> Vec<Edge> {
    let n = nodes.len().min(sim.len());
    if n < 2 || k == 0 {
        return Vec::new();
    }

    let mut pairs: BTreeMap<(usize, usize), (f64, bool)> = BTreeMap::new();
    for i in 0..n {
        let row = &sim.row(i)[..n];
        for j in top_k_indices(row, k, Some(i)) {
            let w = row[j];
            if w <= 0.0 {
                continue;
            }
            let key = (i.min(j), i.max(j));
            pairs
                .entry(key)
                .and_modify(|(existing, mutual)| {
                    *existing = existing.max(w) * MUTUAL_BOOST;
                    *mutual = true;
                })
                .or_insert((w, false));
        }
    }

    pairs
        .into_iter()
        .filter_map(|((i, j), (w, _))| {
            let weight = round_weight(w.min(1.0));
            if weight <= 0.0 {
                return None;
            }
            Edge::new(nodes[i].id.clone(), nodes[j].id.clone(), weight, EdgeMethod::Knn)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    fn nodes(n: usize) -> Vec<Node> {
        (1..=n)
            .map(|i| Node::new(crate::graph::NodeId::from_sequence(i as u32), format!("m{}", i), NodeType::Fact))
            .collect()
    }

    // === Scenario: five nodes, 0 and 1 are each other's nearest neighbour ===
    fn five_node_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.1, 0.0, 0.2],
            vec![0.9, 1.0, 0.3, 0.1, 0.0],
            vec![0.1, 0.3, 1.0, 0.5, 0.0],
            vec![0.0, 0.1, 0.5, 1.0, 0.6],
            vec![0.2, 0.0, 0.0, 0.6, 1.0],
        ])
    }

    #[test]
    fn mutual_pair_is_boosted_and_clamped() {
        let nodes = nodes(5);
        let edges = knn_edges(&nodes, 1, &five_node_matrix());

        let e01 = edges
            .iter()
            .find(|e| e.source.as_str() == "n0001" && e.target.as_str() == "n0002")
            .unwrap();
        // 0.9 * 1.2 = 1.08, clamped
        assert_eq!(e01.weight, 1.0);
        assert!(edges.iter().all(|e| e.method == EdgeMethod::Knn));
    }

    #[test]
    fn no_self_pairs_and_one_edge_per_pair() {
        let nodes = nodes(5);
        let edges = knn_edges(&nodes, 2, &five_node_matrix());

        assert!(edges.iter().all(|e| e.source != e.target));
        let mut keys: Vec<_> = edges.iter().map(Edge::key).collect();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn one_sided_pair_keeps_plain_similarity() {
        let nodes = nodes(5);
        let edges = knn_edges(&nodes, 1, &five_node_matrix());
        // node 2 picks node 3 (0.5), node 3 picks node 4 (0.6): 2-3 is one-sided
        let e23 = edges.iter().find(|e| e.source.as_str() == "n0003" && e.target.as_str() == "n0004").unwrap();
        assert_eq!(e23.weight, 0.5);
        // 3-4 is mutual: 0.6 * 1.2
        let e34 = edges.iter().find(|e| e.source.as_str() == "n0004" && e.target.as_str() == "n0005").unwrap();
        assert_eq!(e34.weight, 0.72);
    }

    // === Scenario: k=2, node 0 nearest to {1, 2}, node 1 nearest to {0, 3} ===
    fn two_neighbour_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.8, 0.7, 0.1, 0.0],
            vec![0.8, 1.0, 0.2, 0.6, 0.1],
            vec![0.7, 0.2, 1.0, 0.3, 0.4],
            vec![0.1, 0.6, 0.3, 1.0, 0.5],
            vec![0.0, 0.1, 0.4, 0.5, 1.0],
        ])
    }

    #[test]
    fn k2_mutual_neighbours_are_boosted() {
        let nodes = nodes(5);
        let sim = two_neighbour_matrix();
        assert_eq!(top_k_indices(sim.row(0), 2, Some(0)), vec![1, 2]);
        assert_eq!(top_k_indices(sim.row(1), 2, Some(1)), vec![0, 3]);

        let edges = knn_edges(&nodes, 2, &sim);
        let weight = |a: &str, b: &str| {
            edges
                .iter()
                .find(|e| e.source.as_str() == a && e.target.as_str() == b)
                .map(|e| e.weight)
        };

        // 0.8 * 1.2 and 0.7 * 1.2
        assert_eq!(weight("n0001", "n0002"), Some(0.96));
        assert_eq!(weight("n0001", "n0003"), Some(0.84));
        assert_eq!(weight("n0002", "n0004"), Some(0.72));
        assert_eq!(weight("n0001", "n0004"), None);
        assert!(edges.iter().all(|e| e.source != e.target));
        assert_eq!(edges.len(), 5);
    }

    #[test]
    fn non_positive_similarities_are_not_linked() {
        let nodes = nodes(3);
        let sim = SimilarityMatrix::zeros(3);
        assert!(knn_edges(&nodes, 2, &sim).is_empty());
    }

    #[test]
    fn fewer_than_two_nodes_yield_nothing() {
        let nodes = nodes(1);
        assert!(knn_edges(&nodes, 5, &SimilarityMatrix::from_rows(vec![vec![1.0]])).is_empty());
    }

    #[test]
    fn top_k_breaks_ties_by_index() {
        assert_eq!(top_k_indices(&[0.5, 0.9, 0.5, 0.5], 3, Some(1)), vec![0, 2, 3]);
    }
}
