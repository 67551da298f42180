//! Memory node representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a memory node.
///
/// Sequential ids look like `n0042`; the zero padding keeps string order
/// and numeric order in agreement for the first ten thousand nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the sequential id for position `n` (`n0001`, `n0002`, ...)
    pub fn from_sequence(n: u32) -> Self {
        Self(format!("n{:04}", n))
    }

    /// Numeric part of a sequential id, `None` for ids of any other shape
    pub fn sequence(&self) -> Option<u32> {
        self.0.strip_prefix('n').and_then(|digits| digits.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of memory a node holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    #[default]
    Fact,
    Intention,
    Entity,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Fact => "fact",
            NodeType::Intention => "intention",
            NodeType::Entity => "entity",
            NodeType::Other(s) => s,
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "fact" => NodeType::Fact,
            "intention" => NodeType::Intention,
            "entity" => NodeType::Entity,
            _ => NodeType::Other(s),
        }
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single memory unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Session tag; nodes without one never receive co-occurrence edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, content: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            node_type,
            session: None,
            keywords: Vec::new(),
            context_hint: None,
            created_at: None,
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_hint(mut self, hint: impl Into<String>) -> Self {
        self.context_hint = Some(hint.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Text used for matching and TF-IDF: content followed by keywords
    pub fn searchable_text(&self) -> String {
        if self.keywords.is_empty() {
            self.content.clone()
        } else {
            format!("{} {}", self.content, self.keywords.join(" "))
        }
    }

    pub fn in_session(&self, session: &str) -> bool {
        self.session.as_deref() == Some(session)
    }

    /// Check the record before it enters the graph.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("node id is empty".to_string());
        }
        if self.content.trim().is_empty() {
            return Err(format!("node {} has empty content", self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ids_round_trip_with_padding() {
        let id = NodeId::from_sequence(42);
        assert_eq!(id.as_str(), "n0042");
        assert_eq!(id.sequence(), Some(42));
        assert_eq!(NodeId::from("hub-a").sequence(), None);
    }

    #[test]
    fn padded_ids_sort_numerically() {
        let mut ids = vec![NodeId::from_sequence(10), NodeId::from_sequence(9), NodeId::from_sequence(100)];
        ids.sort();
        let seqs: Vec<_> = ids.iter().filter_map(NodeId::sequence).collect();
        assert_eq!(seqs, vec![9, 10, 100]);
    }

    #[test]
    fn node_type_serializes_as_plain_string() {
        let node = Node::new("n0001", "likes tea", NodeType::Intention);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "intention");

        let other: Node = serde_json::from_str(r#"{"id":"n0002","content":"x","type":"question"}"#).unwrap();
        assert_eq!(other.node_type, NodeType::Other("question".to_string()));
        assert!(other.keywords.is_empty());
        assert!(other.session.is_none());
    }

    #[test]
    fn searchable_text_appends_keywords() {
        let node = Node::new("n0001", "deploy service", NodeType::Fact).with_keywords(["ops", "ci"]);
        assert_eq!(node.searchable_text(), "deploy service ops ci");
    }

    #[test]
    fn validate_rejects_blank_content() {
        let node = Node::new("n0001", "   ", NodeType::Fact);
        assert!(node.validate().is_err());
        assert!(Node::new("n0001", "ok", NodeType::Fact).validate().is_ok());
    }
}
