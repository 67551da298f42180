//! In-memory storage backend

use super::traits::{check_nodes, check_view_name, GraphRecord, NetworkStore, StorageError, StorageResult};
use crate::evaluate::ContextTable;
use crate::graph::Node;
use crate::topology::TopologyStats;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    nodes: Vec<Node>,
    embeddings: Vec<Vec<f32>>,
    graphs: BTreeMap<String, GraphRecord>,
    stats: BTreeMap<String, TopologyStats>,
    summary: Vec<TopologyStats>,
    contexts: ContextTable,
}

/// Store holding everything in memory. Thread-safe via RwLock.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with nodes and aligned embeddings
    pub fn with_network(nodes: Vec<Node>, embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            state: RwLock::new(State {
                nodes,
                embeddings,
                ..State::default()
            }),
        }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl NetworkStore for InMemoryStore {
    fn load_nodes(&self) -> StorageResult<Vec<Node>> {
        let nodes = self.read()?.nodes.clone();
        check_nodes(&nodes)?;
        Ok(nodes)
    }

    fn save_nodes(&self, nodes: &[Node]) -> StorageResult<()> {
        check_nodes(nodes)?;
        self.write()?.nodes = nodes.to_vec();
        Ok(())
    }

    fn load_embeddings(&self) -> StorageResult<Vec<Vec<f32>>> {
        Ok(self.read()?.embeddings.clone())
    }

    fn save_embeddings(&self, embeddings: &[Vec<f32>]) -> StorageResult<()> {
        self.write()?.embeddings = embeddings.to_vec();
        Ok(())
    }

    fn load_graph(&self, view: &str) -> StorageResult<Option<GraphRecord>> {
        check_view_name(view)?;
        Ok(self.read()?.graphs.get(view).cloned())
    }

    fn save_graph(&self, record: &GraphRecord) -> StorageResult<()> {
        check_view_name(&record.view)?;
        self.write()?.graphs.insert(record.view.clone(), record.clone());
        Ok(())
    }

    fn load_stats(&self, view: &str) -> StorageResult<Option<TopologyStats>> {
        check_view_name(view)?;
        Ok(self.read()?.stats.get(view).cloned())
    }

    fn save_stats(&self, view: &str, stats: &TopologyStats) -> StorageResult<()> {
        check_view_name(view)?;
        self.write()?.stats.insert(view.to_string(), stats.clone());
        Ok(())
    }

    fn load_summary(&self) -> StorageResult<Vec<TopologyStats>> {
        Ok(self.read()?.summary.clone())
    }

    fn save_summary(&self, summary: &[TopologyStats]) -> StorageResult<()> {
        self.write()?.summary = summary.to_vec();
        Ok(())
    }

    fn list_views(&self) -> StorageResult<Vec<String>> {
        Ok(self.read()?.graphs.keys().cloned().collect())
    }

    fn load_contexts(&self) -> StorageResult<ContextTable> {
        Ok(self.read()?.contexts.clone())
    }

    fn save_contexts(&self, contexts: &ContextTable) -> StorageResult<()> {
        self.write()?.contexts = contexts.clone();
        Ok(())
    }
}
