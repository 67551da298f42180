//! Storage trait definitions

use crate::evaluate::ContextTable;
use crate::graph::{Edge, Node};
use crate::topology::TopologyStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid view name: {0}")]
    InvalidView(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted edge list of one graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub view: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
    pub edges: Vec<Edge>,
}

impl GraphRecord {
    pub fn new(view: impl Into<String>, edges: Vec<Edge>) -> Self {
        Self {
            view: view.into(),
            built_at: Some(Utc::now()),
            edges,
        }
    }
}

/// View names become directory names; reject anything that is not a plain
/// path component.
pub(crate) fn check_view_name(view: &str) -> StorageResult<()> {
    let ok = !view.is_empty()
        && view != "."
        && view != ".."
        && view
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidView(view.to_string()))
    }
}

/// Reject nodes that fail validation or repeat an id.
pub(crate) fn check_nodes(nodes: &[Node]) -> StorageResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(nodes.len());
    for node in nodes {
        node.validate().map_err(StorageError::InvalidRecord)?;
        if !seen.insert(&node.id) {
            return Err(StorageError::InvalidRecord(format!("duplicate node id {}", node.id)));
        }
    }
    Ok(())
}

/// Persisted memory network: nodes, aligned embeddings, and graph views
///
/// Implementations must be thread-safe (Send + Sync). Every save replaces
/// the previous record as a whole.
pub trait NetworkStore: Send + Sync {
    // === Nodes and embeddings ===

    /// Load all nodes in stored order; empty if none were saved
    fn load_nodes(&self) -> StorageResult<Vec<Node>>;

    fn save_nodes(&self, nodes: &[Node]) -> StorageResult<()>;

    /// Load the embedding table (aligned with the node list)
    fn load_embeddings(&self) -> StorageResult<Vec<Vec<f32>>>;

    fn save_embeddings(&self, embeddings: &[Vec<f32>]) -> StorageResult<()>;

    // === Graph views ===

    fn load_graph(&self, view: &str) -> StorageResult<Option<GraphRecord>>;

    fn save_graph(&self, record: &GraphRecord) -> StorageResult<()>;

    fn load_stats(&self, view: &str) -> StorageResult<Option<TopologyStats>>;

    fn save_stats(&self, view: &str, stats: &TopologyStats) -> StorageResult<()>;

    /// Stats of every view built by the last sweep
    fn load_summary(&self) -> StorageResult<Vec<TopologyStats>>;

    fn save_summary(&self, summary: &[TopologyStats]) -> StorageResult<()>;

    /// Names of views with a saved graph, sorted
    fn list_views(&self) -> StorageResult<Vec<String>>;

    // === Evaluation ===

    /// Contexts of the last scenario evaluation; empty if none was run
    fn load_contexts(&self) -> StorageResult<ContextTable>;

    fn save_contexts(&self, contexts: &ContextTable) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: NetworkStore + Sized {
    /// Open or create a store rooted at the given directory
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;
}
