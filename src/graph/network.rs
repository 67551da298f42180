//! Graph: the node set plus one synthesized edge view

use super::edge::Edge;
use super::node::{Node, NodeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when assembling a graph
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Edge {source_id} -> {target_id} references a node not in the graph")]
    DanglingEdge { source_id: NodeId, target_id: NodeId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Result type for graph assembly
pub type GraphResult<T> = Result<T, GraphError>;

/// A weighted undirected memory graph.
///
/// Holds at most one edge per unordered pair, and every edge endpoint is a
/// node of the graph. Node order is significant: it is the order nodes were
/// loaded in, which is also the row order of the embedding table.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
    edge_index: HashMap<(NodeId, NodeId), usize>,
}

impl Graph {
    /// Create an edgeless graph over `nodes`
    pub fn new(nodes: Vec<Node>) -> GraphResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self {
            nodes,
            edges: Vec::new(),
            index,
            edge_index: HashMap::new(),
        })
    }

    /// Assemble a graph from a node list and a persisted edge list
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphResult<Self> {
        let mut graph = Self::new(nodes)?;
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Add an edge.
    ///
    /// A second edge on an existing unordered pair keeps the larger weight
    /// (and the method of whichever edge carried it).
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.index.contains_key(&edge.source) || !self.index.contains_key(&edge.target) {
            return Err(GraphError::DanglingEdge {
                source_id: edge.source,
                target_id: edge.target,
            });
        }
        let key = edge.key();
        match self.edge_index.get(&key) {
            Some(&i) => {
                if edge.weight > self.edges[i].weight {
                    self.edges[i] = edge;
                }
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
        Ok(())
    }

    pub fn add_node(&mut self, node: Node) -> GraphResult<()> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Remove every node matching `pred` together with its edges.
    ///
    /// Returns the positions (in the original order) of the removed nodes so
    /// callers can drop the aligned embedding rows.
    pub fn remove_nodes_where<F>(&mut self, pred: F) -> Vec<usize>
    where
        F: Fn(&Node) -> bool,
    {
        let removed: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| pred(n))
            .map(|(i, _)| i)
            .collect();
        if removed.is_empty() {
            return removed;
        }

        let mut keep_nodes = Vec::with_capacity(self.nodes.len() - removed.len());
        let mut gone = Vec::with_capacity(removed.len());
        for node in self.nodes.drain(..) {
            if pred(&node) {
                gone.push(node.id);
            } else {
                keep_nodes.push(node);
            }
        }
        let edges: Vec<Edge> = self
            .edges
            .drain(..)
            .filter(|e| !gone.iter().any(|id| e.touches(id)))
            .collect();

        self.nodes = keep_nodes;
        self.reindex();
        for edge in edges {
            self.edge_index.insert(edge.key(), self.edges.len());
            self.edges.push(edge);
        }
        removed
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.edge_index.clear();
        self.edges.clear();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Weight of the edge between `a` and `b`, if any
    pub fn edge_weight(&self, a: &NodeId, b: &NodeId) -> Option<f64> {
        let key = if a < b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.edge_index.get(&key).map(|&i| self.edges[i].weight)
    }

    /// Largest sequence number among node ids (0 when there is none)
    pub fn max_sequence(&self) -> u32 {
        self.nodes
            .iter()
            .filter_map(|n| n.id.sequence())
            .max()
            .unwrap_or(0)
    }

    /// Index-based neighbour lists, both directions
    pub fn adjacency(&self) -> Adjacency {
        let mut neighbors = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let (Some(&s), Some(&t)) = (self.index.get(&edge.source), self.index.get(&edge.target)) else {
                continue;
            };
            neighbors[s].push((t, edge.weight));
            neighbors[t].push((s, edge.weight));
        }
        Adjacency { neighbors }
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

/// Neighbour lists indexed by node position
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        self.neighbors.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, i: usize) -> usize {
        self.neighbors(i).len()
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
