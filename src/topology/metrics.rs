//! Graph algorithms over index-based adjacency
//!
//! Connected components, BFS distances, average shortest path (exact and
//! sampled) and local clustering.

use crate::graph::Adjacency;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{HashSet, VecDeque};

/// Connected components, largest first. Isolated nodes are singleton components.
pub fn connected_components(adj: &Adjacency) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(node) = stack.pop() {
            component.push(node);
            for &(next, _) in adj.neighbors(node) {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        components.push(component);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()));
    components
}

/// Hop distances from `source`; `None` for unreachable nodes
pub fn bfs_distances(adj: &Adjacency, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    if source >= adj.len() {
        return dist;
    }
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(node) = queue.pop_front() {
        let d = dist[node].unwrap_or(0);
        for &(next, _) in adj.neighbors(node) {
            if dist[next].is_none() {
                dist[next] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Mean hop distance over all ordered pairs of `members`.
///
/// `members` is expected to be one connected component; a single-node
/// component averages to 0.
pub fn average_shortest_path(adj: &Adjacency, members: &[usize]) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    let mut total = 0usize;
    let mut pairs = 0usize;
    for &src in members {
        let dist = bfs_distances(adj, src);
        for &tgt in members {
            if tgt != src {
                if let Some(d) = dist[tgt] {
                    total += d;
                    pairs += 1;
                }
            }
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total as f64 / pairs as f64
    }
}

/// Estimate the mean path length among a seeded random sample of `pool`.
///
/// Distances are measured between sampled nodes only; unreachable pairs are
/// skipped. `None` when no sampled pair is connected.
pub fn sampled_average_path(adj: &Adjacency, pool: &[usize], sample_size: usize, seed: u64) -> Option<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<usize> = pool
        .choose_multiple(&mut rng, sample_size.min(pool.len()))
        .copied()
        .collect();

    let mut total = 0usize;
    let mut pairs = 0usize;
    for &src in &samples {
        let dist = bfs_distances(adj, src);
        for &tgt in &samples {
            if tgt != src {
                if let Some(d) = dist[tgt] {
                    total += d;
                    pairs += 1;
                }
            }
        }
    }
    (pairs > 0).then(|| total as f64 / pairs as f64)
}

/// Mean local clustering coefficient; nodes with degree < 2 count as 0.
pub fn average_clustering(adj: &Adjacency) -> f64 {
    let n = adj.len();
    if n == 0 {
        return 0.0;
    }
    let neighbor_sets: Vec<HashSet<usize>> = (0..n)
        .map(|i| adj.neighbors(i).iter().map(|&(j, _)| j).filter(|&j| j != i).collect())
        .collect();

    let total: f64 = neighbor_sets
        .iter()
        .map(|nbrs| {
            let deg = nbrs.len();
            if deg < 2 {
                return 0.0;
            }
            let members: Vec<usize> = nbrs.iter().copied().collect();
            let mut links = 0usize;
            for (a, &u) in members.iter().enumerate() {
                for &v in &members[a + 1..] {
                    if neighbor_sets[u].contains(&v) {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (deg * (deg - 1)) as f64
        })
        .sum();
    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeMethod, Graph, Node, NodeId, NodeType};

    fn graph(n: u32, pairs: &[(u32, u32)]) -> Graph {
        let nodes = (1..=n)
            .map(|i| Node::new(NodeId::from_sequence(i), "x", NodeType::Fact))
            .collect();
        let edges = pairs
            .iter()
            .filter_map(|&(a, b)| {
                Edge::new(NodeId::from_sequence(a), NodeId::from_sequence(b), 1.0, EdgeMethod::Knn)
            })
            .collect();
        Graph::from_parts(nodes, edges).unwrap()
    }

    #[test]
    fn components_include_isolated_nodes() {
        let g = graph(5, &[(1, 2), (2, 3)]);
        let comps = connected_components(&g.adjacency());
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].len(), 3);
    }

    #[test]
    fn path_length_of_a_chain() {
        // 1-2-3: distances 1,2,1 per direction -> 8 / 6
        let g = graph(3, &[(1, 2), (2, 3)]);
        let avg = average_shortest_path(&g.adjacency(), &[0, 1, 2]);
        assert!((avg - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn sampled_path_matches_exact_when_sample_covers_pool() {
        let g = graph(4, &[(1, 2), (2, 3), (3, 4)]);
        let adj = g.adjacency();
        let exact = average_shortest_path(&adj, &[0, 1, 2, 3]);
        let sampled = sampled_average_path(&adj, &[0, 1, 2, 3], 200, 42).unwrap();
        assert!((exact - sampled).abs() < 1e-9);
    }

    #[test]
    fn sampled_path_is_none_without_connected_pairs() {
        let g = graph(3, &[]);
        assert_eq!(sampled_average_path(&g.adjacency(), &[0, 1, 2], 10, 42), None);
    }

    #[test]
    fn clustering_of_triangle_with_tail() {
        // triangle 1-2-3 plus 3-4: c1 = c2 = 1, c3 = 1/3, c4 = 0
        let g = graph(4, &[(1, 2), (2, 3), (1, 3), (3, 4)]);
        let c = average_clustering(&g.adjacency());
        assert!((c - (1.0 + 1.0 + 1.0 / 3.0) / 4.0).abs() < 1e-9);
    }
}
