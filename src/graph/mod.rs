//! Core graph data structures

mod edge;
mod network;
mod node;

#[cfg(test)]
mod tests;

pub use edge::{round_weight, Edge, EdgeMethod};
pub use network::{Adjacency, Graph, GraphError, GraphResult};
pub use node::{Node, NodeId, NodeType};
