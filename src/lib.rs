//! memnet: memory graph retrieval
//!
//! Models memories as nodes of a weighted undirected graph and retrieves
//! related memories by spreading activation from query-relevant seeds.
//!
//! # Core Concepts
//!
//! - **Views**: graphs synthesized from embedding k-NN, intra-session
//!   co-occurrence, or a weighted fusion of both
//! - **Gate**: topology checks deciding whether a view is usable on its own
//! - **Activation**: seeds spread their score along edges with per-hop decay;
//!   results from several views are fused
//! - **Hubs**: identity nodes deliberately connected to many memories
//! - **Evaluation**: canned scenarios run over every usable view, fusion
//!   strategy and baseline
//!
//! # Example
//!
//! ```
//! use memnet::{Graph, Node, NodeType, SpreadingActivation, ActivationMap, NodeId};
//!
//! let graph = Graph::new(vec![Node::new("n0001", "likes tea", NodeType::Fact)]).unwrap();
//! let seeds: ActivationMap = [(NodeId::from("n0001"), 1.0)].into_iter().collect();
//! let scores = SpreadingActivation::new().activate(&graph, &seeds);
//! assert_eq!(scores.get(&NodeId::from("n0001")), 1.0);
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod embedding;
mod engine;
pub mod evaluate;
mod graph;
pub mod hub;
pub mod storage;
pub mod topology;

pub use activation::{
    format_for_prompt, ActivatedNode, ActivationMap, FusionConfig, FusionKind, SeedSource, SpreadingActivation,
};
pub use builder::{BuildError, BuildMethod, GraphBuilder, SimilarityMatrix, ViewSpec};
pub use config::{MemnetConfig, SimilaritySource};
pub use embedding::{Embedder, EmbeddingError};
pub use engine::{EmbeddingStatus, MemnetError, MemnetResult, MemoryEngine, QueryRequest, QueryResponse, ViewGate};
pub use evaluate::{Evaluation, Scenario, ScenarioContext};
pub use graph::{round_weight, Adjacency, Edge, EdgeMethod, Graph, GraphError, GraphResult, Node, NodeId, NodeType};
pub use hub::{HubConfig, HubDefinition, HubInjection};
pub use storage::{GraphRecord, InMemoryStore, JsonFileStore, NetworkStore, OpenStore, StorageError, StorageResult};
pub use topology::{GateThresholds, HubReport, TopologyConfig, TopologyStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
