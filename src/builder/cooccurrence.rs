//! Session co-occurrence edge synthesis
//!
//! Nodes from the same session are ordered by id; pairs at most
//! `MAX_DISTANCE` positions apart are candidates with weight
//! `1 / (1 + 0.5 * d)`. Each node then keeps its own top-k partners, and
//! the edge set is the union of those selections, so a node chosen by many
//! neighbours can end up with more than k edges.

use crate::graph::{round_weight, Edge, EdgeMethod, Node};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Largest positional distance within a session that still links two nodes
pub const MAX_DISTANCE: usize = 3;

/// Candidate weight for two nodes `distance` positions apart
pub fn distance_weight(distance: usize) -> f64 {
    1.0 / (1.0 + distance as f64 * 0.5)
}

pub fn cooccurrence_edges(nodes: &[Node], k: usize) -> Vec<Edge> {
    if k == 0 {
        return Vec::new();
    }

    let mut sessions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if let Some(session) = node.session.as_deref().filter(|s| !s.is_empty()) {
            sessions.entry(session).or_default().push(i);
        }
    }

    let mut candidates: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for members in sessions.values_mut() {
        members.sort_by(|&a, &b| nodes[a].id.cmp(&nodes[b].id));
        for a in 0..members.len() {
            for b in (a + 1)..members.len().min(a + MAX_DISTANCE + 1) {
                let (i, j) = (members[a], members[b]);
                let key = (i.min(j), i.max(j));
                let w = distance_weight(b - a);
                let slot = candidates.entry(key).or_insert(0.0);
                *slot = slot.max(w);
            }
        }
    }

    let mut partners: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
    for (&(i, j), &w) in &candidates {
        partners.entry(i).or_default().push((j, w));
        partners.entry(j).or_default().push((i, w));
    }

    let mut selected: BTreeSet<(usize, usize)> = BTreeSet::new();
    for (&node, list) in partners.iter_mut() {
        list.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        for &(other, _) in list.iter().take(k) {
            selected.insert((node.min(other), node.max(other)));
        }
    }

    selected
        .into_iter()
        .filter_map(|key| {
            let w = candidates.get(&key).copied()?;
            Edge::new(
                nodes[key.0].id.clone(),
                nodes[key.1].id.clone(),
                round_weight(w),
                EdgeMethod::Cooccurrence,
            )
        })
        .collect()
}
