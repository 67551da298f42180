//! Activation maps and extracted results

use crate::graph::{round_weight, Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Node → non-negative activation score; absent ids score 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationMap {
    scores: HashMap<NodeId, f64>,
}

impl ActivationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NodeId) -> f64 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    /// Set a score; negative values are clamped to 0.
    pub fn set(&mut self, id: NodeId, score: f64) {
        self.scores.insert(id, score.max(0.0));
    }

    /// Raise a score to `score` if it is higher than the current one.
    pub fn raise(&mut self, id: NodeId, score: f64) {
        let slot = self.scores.entry(id).or_insert(0.0);
        if score > *slot {
            *slot = score;
        }
    }

    /// Add `score` to the current value.
    pub fn add(&mut self, id: &NodeId, score: f64) {
        *self.scores.entry(id.clone()).or_insert(0.0) += score.max(0.0);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.scores.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, f64)> {
        self.scores.iter().map(|(id, s)| (id, *s))
    }

    pub fn max(&self) -> f64 {
        self.scores.values().copied().fold(0.0, f64::max)
    }

    /// Divide every score by the maximum. A map whose maximum is 0 is left as is.
    pub fn normalize(&mut self) {
        let max = self.max();
        if max > 0.0 {
            for s in self.scores.values_mut() {
                *s /= max;
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// All entries, highest score first; ties ordered by id
    pub fn ranked(&self) -> Vec<(NodeId, f64)> {
        let mut entries: Vec<(NodeId, f64)> = self.scores.iter().map(|(id, s)| (id.clone(), *s)).collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }

    pub fn top(&self, n: usize) -> Vec<(NodeId, f64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Top-`n` results with node metadata looked up in `nodes`.
    ///
    /// Ids missing from `nodes` are still returned, with empty content.
    pub fn extract(&self, nodes: &[Node], n: usize) -> Vec<ActivatedNode> {
        let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|node| (&node.id, node)).collect();
        self.top(n)
            .into_iter()
            .map(|(id, score)| match by_id.get(&id) {
                Some(node) => ActivatedNode {
                    score: round_weight(score),
                    content: node.content.clone(),
                    node_type: node.node_type.clone(),
                    session: node.session.clone(),
                    context_hint: node.context_hint.clone(),
                    id,
                },
                None => ActivatedNode {
                    id,
                    score: round_weight(score),
                    content: String::new(),
                    node_type: NodeType::default(),
                    session: None,
                    context_hint: None,
                },
            })
            .collect()
    }
}

impl FromIterator<(NodeId, f64)> for ActivationMap {
    fn from_iter<I: IntoIterator<Item = (NodeId, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, s) in iter {
            map.set(id, s);
        }
        map
    }
}

/// A retrieved memory with its activation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedNode {
    pub id: NodeId,
    /// Rounded to 4 decimals
    pub score: f64,
    pub content: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
}

/// Render results as prompt lines: `- [intention] content (session)`.
///
/// Every type other than intention is tagged `fact`.
pub fn format_for_prompt(results: &[ActivatedNode]) -> String {
    let mut out = String::new();
    for r in results {
        let tag = if r.node_type == NodeType::Intention { "intention" } else { "fact" };
        let _ = write!(out, "- [{}] {}", tag, r.content);
        if let Some(session) = r.session.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(out, " ({})", session);
        }
        out.push('\n');
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> ActivationMap {
        entries.iter().map(|(id, s)| (NodeId::from(*id), *s)).collect()
    }

    #[test]
    fn normalize_scales_max_to_one() {
        let m = map(&[("a", 0.5), ("b", 0.25)]).normalized();
        assert_eq!(m.get(&"a".into()), 1.0);
        assert_eq!(m.get(&"b".into()), 0.5);
        assert_eq!(m.get(&"missing".into()), 0.0);
    }

    #[test]
    fn normalize_leaves_all_zero_map_alone() {
        let m = map(&[("a", 0.0)]).normalized();
        assert_eq!(m.get(&"a".into()), 0.0);
        assert!(ActivationMap::new().normalized().is_empty());
    }

    #[test]
    fn ranking_breaks_ties_by_id() {
        let m = map(&[("n0003", 0.5), ("n0001", 0.5), ("n0002", 0.9)]);
        let ids: Vec<_> = m.ranked().into_iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["n0002", "n0001", "n0003"]);
    }

    #[test]
    fn extract_attaches_metadata() {
        let nodes = vec![Node::new("n0001", "prefers tea", NodeType::Intention)
            .with_session("s3")
            .with_context_hint("habits")];
        let m = map(&[("n0001", 0.123456), ("ghost", 0.1)]);
        let out = m.extract(&nodes, 15);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].score, 0.1235);
        assert_eq!(out[0].context_hint.as_deref(), Some("habits"));
        assert_eq!(out[1].content, "");
    }

    #[test]
    fn prompt_lines_tag_intentions() {
        let results = vec![
            ActivatedNode {
                id: "n1".into(),
                score: 1.0,
                content: "keep answers short".into(),
                node_type: NodeType::Intention,
                session: Some("s2".into()),
                context_hint: None,
            },
            ActivatedNode {
                id: "n2".into(),
                score: 0.5,
                content: "uses rust".into(),
                node_type: NodeType::Entity,
                session: None,
                context_hint: None,
            },
        ];
        assert_eq!(
            format_for_prompt(&results),
            "- [intention] keep answers short (s2)\n- [fact] uses rust"
        );
    }
}
