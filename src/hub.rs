//! Identity hub injection
//!
//! Hubs are a small fixed set of nodes describing who the agent is. Each hub
//! connects to far more memories than an ordinary node does, so spreading
//! activation reaches the relevant identity facts from almost any query.
//! Injection is idempotent: existing hubs are removed before new ones are
//! added.

use crate::builder::top_k_indices;
use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};
use crate::graph::{round_weight, Edge, EdgeMethod, Graph, GraphError, Node, NodeId, NodeType};
use crate::topology::{preview, HubDetail, HubReport, TopologyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("{nodes} nodes but {embeddings} embeddings")]
    EmbeddingMismatch { nodes: usize, embeddings: usize },
}

/// One hub node to inject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubDefinition {
    pub content: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
}

impl HubDefinition {
    pub fn new(content: impl Into<String>, node_type: NodeType, context_hint: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            node_type,
            context_hint: Some(context_hint.into()),
        }
    }

    /// Built-in hubs along five axes: identity, relationship, philosophy,
    /// conduct and project context.
    pub fn defaults() -> Vec<Self> {
        use NodeType::{Fact, Intention};
        vec![
            Self::new(
                "I am the assistant, a colleague who builds this project together with my partner",
                Fact,
                "identity/self",
            ),
            Self::new(
                "My role is design, task management and converging decisions; sub-agents write the code",
                Fact,
                "identity/role",
            ),
            Self::new(
                "My partner and I work as equals, not as command and obedience",
                Fact,
                "relationship/partnership",
            ),
            Self::new(
                "We combine each other's strengths to reach the best result",
                Intention,
                "relationship/synergy",
            ),
            Self::new(
                "Before the surface task (what), explore the underlying purpose (why)",
                Intention,
                "philosophy/purpose",
            ),
            Self::new(
                "When I see a logical error or inefficiency I raise it politely but clearly",
                Intention,
                "philosophy/critical-review",
            ),
            Self::new(
                "I propose necessary follow-up work without waiting to be asked",
                Intention,
                "philosophy/proactive",
            ),
            Self::new(
                "I communicate at peer level, directly and concisely",
                Fact,
                "conduct/communication",
            ),
            Self::new(
                "When uncertain I say so openly and ask my partner to step in",
                Fact,
                "conduct/transparency",
            ),
            Self::new(
                "Critical review produces abstraction, and abstraction simplifies structure",
                Fact,
                "conduct/abstraction",
            ),
            Self::new(
                "This project builds a method for human and AI collaboration and a memory system for it",
                Fact,
                "project/memory",
            ),
            Self::new(
                "The research companion service applies the same collaboration philosophy to a product",
                Fact,
                "project/service",
            ),
        ]
    }
}

/// Settings of the `hub` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Existing nodes each hub connects to
    pub hub_k: usize,
    /// Hub pairs above this similarity are connected
    pub hub_hub_threshold: f64,
    /// Minimum weight of a hub → node edge
    pub weight_floor: f64,
    /// Session marking hub nodes
    pub session: String,
    pub definitions: Vec<HubDefinition>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            hub_k: 100,
            hub_hub_threshold: 0.4,
            weight_floor: 0.3,
            session: "identity".to_string(),
            definitions: HubDefinition::defaults(),
        }
    }
}

impl HubConfig {
    pub fn with_hub_k(mut self, hub_k: usize) -> Self {
        self.hub_k = hub_k;
        self
    }

    pub fn is_hub(&self, node: &Node) -> bool {
        node.in_session(&self.session)
    }
}

/// Result of an injection run, not yet persisted
#[derive(Debug, Clone)]
pub struct HubInjection {
    /// Graph carrying the general nodes followed by the hubs
    pub graph: Graph,
    /// Embeddings aligned with `graph.nodes()`
    pub embeddings: Vec<Vec<f32>>,
    pub hub_ids: Vec<NodeId>,
    /// Hubs removed before injecting
    pub removed: usize,
    pub report: HubReport,
}

impl HubInjection {
    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }
}

/// Remove hub nodes, their edges, and their embedding rows.
///
/// Returns the number of hubs removed.
pub fn remove_hubs(graph: &mut Graph, embeddings: &mut Vec<Vec<f32>>, session: &str) -> usize {
    let removed = graph.remove_nodes_where(|n| n.in_session(session));
    for &i in removed.iter().rev() {
        if i < embeddings.len() {
            embeddings.remove(i);
        }
    }
    if !removed.is_empty() {
        info!(count = removed.len(), "removed existing hubs");
    }
    removed.len()
}

/// Inject hubs whose embeddings are already known.
///
/// `embeddings` is aligned with `graph.nodes()`; `hub_embeddings` with
/// `config.definitions`.
pub fn inject_with_embeddings(
    mut graph: Graph,
    mut embeddings: Vec<Vec<f32>>,
    hub_embeddings: Vec<Vec<f32>>,
    config: &HubConfig,
    topology: &TopologyConfig,
) -> Result<HubInjection, HubError> {
    if graph.node_count() != embeddings.len() {
        return Err(HubError::EmbeddingMismatch {
            nodes: graph.node_count(),
            embeddings: embeddings.len(),
        });
    }
    if hub_embeddings.len() != config.definitions.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: config.definitions.len(),
            got: hub_embeddings.len(),
        }
        .into());
    }

    let removed = remove_hubs(&mut graph, &mut embeddings, &config.session);
    let general_ids: Vec<NodeId> = graph.nodes().iter().map(|n| n.id.clone()).collect();

    let first = graph.max_sequence() + 1;
    let hubs: Vec<Node> = config
        .definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let mut node = Node::new(NodeId::from_sequence(first + i as u32), def.content.clone(), def.node_type.clone())
                .with_session(config.session.clone());
            node.context_hint = def.context_hint.clone();
            node
        })
        .collect();
    let hub_ids: Vec<NodeId> = hubs.iter().map(|h| h.id.clone()).collect();

    let mut details = Vec::with_capacity(hubs.len());
    let mut new_edges = Vec::new();
    for (hub, hub_vec) in hubs.iter().zip(&hub_embeddings) {
        let sims: Vec<f64> = embeddings.iter().map(|e| cosine_similarity(hub_vec, e)).collect();
        let chosen = top_k_indices(&sims, config.hub_k, None);
        for &j in &chosen {
            let weight = round_weight(sims[j].max(config.weight_floor));
            new_edges.extend(Edge::new(hub.id.clone(), general_ids[j].clone(), weight, EdgeMethod::HubKnn));
        }
        details.push(HubDetail {
            id: hub.id.clone(),
            degree: chosen.len(),
            top_sim: chosen.first().map(|&j| round_weight(sims[j])).unwrap_or(0.0),
            bottom_sim: chosen.last().map(|&j| round_weight(sims[j])).unwrap_or(0.0),
            content: preview(&hub.content, 40),
        });
    }

    for i in 0..hubs.len() {
        for j in (i + 1)..hubs.len() {
            let sim = cosine_similarity(&hub_embeddings[i], &hub_embeddings[j]);
            if sim > config.hub_hub_threshold {
                new_edges.extend(Edge::new(
                    hub_ids[i].clone(),
                    hub_ids[j].clone(),
                    round_weight(sim),
                    EdgeMethod::HubKnn,
                ));
            }
        }
    }
    debug!(edges = new_edges.len(), "hub edges synthesized");

    for hub in hubs {
        graph.add_node(hub)?;
    }
    for edge in new_edges {
        graph.add_edge(edge)?;
    }
    embeddings.extend(hub_embeddings);

    let report = HubReport::compute(&graph, |n| config.is_hub(n), topology).with_details(details);
    info!(
        hubs = hub_ids.len(),
        removed,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "hubs injected"
    );

    Ok(HubInjection {
        graph,
        embeddings,
        hub_ids,
        removed,
        report,
    })
}

/// Embed the hub definitions in one batch, then inject them.
pub async fn inject(
    graph: Graph,
    embeddings: Vec<Vec<f32>>,
    embedder: &dyn Embedder,
    config: &HubConfig,
    topology: &TopologyConfig,
) -> Result<HubInjection, HubError> {
    let texts: Vec<&str> = config.definitions.iter().map(|d| d.content.as_str()).collect();
    let hub_embeddings = if texts.is_empty() {
        Vec::new()
    } else {
        embedder.embed_batch(&texts).await?
    };
    inject_with_embeddings(graph, embeddings, hub_embeddings, config, topology)
}
