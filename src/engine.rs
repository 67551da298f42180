//! MemoryEngine: the main entry point
//!
//! Ties the store, the embedder and the configuration together and exposes
//! the operations the CLI runs: embedding maintenance, view building,
//! retrieval and hub injection.

use crate::activation::{
    embedding_seeds, keyword_seeds, tfidf_seeds, ActivatedNode, ActivationMap, FusionConfig, FusionError,
    FusionKind, SeedSource, SpreadingActivation,
};
use crate::builder::{BuildError, BuildMethod, GraphBuilder, SimilarityMatrix, ViewSpec};
use crate::config::{MemnetConfig, SimilaritySource};
use crate::embedding::{embed_all, Embedder, EmbeddingError};
use crate::evaluate::{random_baseline, Evaluation, Scenario, EMPTY_BASELINE, RANDOM_BASELINE, RANDOM_BASELINE_SEED};
use crate::graph::{Graph, GraphError, Node, NodeId};
use crate::hub::{self, HubError, HubInjection};
use crate::storage::{GraphRecord, NetworkStore, StorageError};
use crate::topology::TopologyStats;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur in memnet operations
#[derive(Debug, Error)]
pub enum MemnetError {
    #[error("No nodes to work on")]
    EmptyNodeSet,

    #[error("{nodes} nodes but {embeddings} embeddings; run `memnet embed` first")]
    EmbeddingMismatch { nodes: usize, embeddings: usize },

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("No embedding provider configured")]
    NoEmbedder,

    #[error("No sweep summary; run `memnet sweep` first")]
    NoSummary,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Fusion error: {0}")]
    Fusion(#[from] FusionError),

    #[error("Hub injection failed: {0}")]
    Hub(#[from] HubError),
}

/// Result type for memnet operations
pub type MemnetResult<T> = Result<T, MemnetError>;

/// Alignment of the node list and the embedding table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingStatus {
    pub nodes: usize,
    pub embeddings: usize,
    /// Vector length of the first embedding
    pub dimension: Option<usize>,
    pub views: Vec<String>,
}

impl EmbeddingStatus {
    pub fn aligned(&self) -> bool {
        self.nodes == self.embeddings
    }
}

/// One retrieval request
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// Free-text query, embedded for seeding
    pub text: Option<String>,
    /// Keyword seeds; take precedence over `text`
    pub keywords: Vec<String>,
    /// Views to activate; empty means the configured views
    pub views: Vec<String>,
    pub seeds: Option<usize>,
    pub hops: Option<usize>,
    pub decay: Option<f64>,
    pub top_n: Option<usize>,
    pub fusion: Option<FusionKind>,
}

impl QueryRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.views.push(view.into());
        self
    }

    pub fn with_fusion(mut self, fusion: FusionKind) -> Self {
        self.fusion = Some(fusion);
        self
    }
}

/// Gate verdict of a served view under the current thresholds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewGate {
    pub view: String,
    /// `None` when the view has no stored stats
    pub gate_pass: Option<bool>,
}

/// Ranked retrieval result
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub seed_source: SeedSource,
    pub seeds: Vec<(NodeId, f64)>,
    pub views: Vec<String>,
    /// One entry per served view, in `views` order
    pub gates: Vec<ViewGate>,
    pub fusion: FusionKind,
    pub results: Vec<ActivatedNode>,
}

/// The memnet engine
///
/// Reads and writes through the injected store and caches loaded graph
/// views by name. Every save drops the affected cache entries.
pub struct MemoryEngine {
    store: Arc<dyn NetworkStore>,
    embedder: Option<Arc<dyn Embedder>>,
    config: MemnetConfig,
    views: DashMap<String, Arc<Graph>>,
}

impl MemoryEngine {
    pub fn new(store: Arc<dyn NetworkStore>, config: MemnetConfig) -> Self {
        Self {
            store,
            embedder: None,
            config,
            views: DashMap::new(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &MemnetConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn NetworkStore {
        self.store.as_ref()
    }

    fn embedder(&self) -> MemnetResult<&dyn Embedder> {
        self.embedder.as_deref().ok_or(MemnetError::NoEmbedder)
    }

    fn load_aligned(&self) -> MemnetResult<(Vec<Node>, Vec<Vec<f32>>)> {
        let nodes = self.store.load_nodes()?;
        if nodes.is_empty() {
            return Err(MemnetError::EmptyNodeSet);
        }
        let embeddings = self.store.load_embeddings()?;
        if embeddings.len() != nodes.len() {
            return Err(MemnetError::EmbeddingMismatch {
                nodes: nodes.len(),
                embeddings: embeddings.len(),
            });
        }
        Ok((nodes, embeddings))
    }

    fn invalidate(&self, view: Option<&str>) {
        match view {
            Some(v) => {
                self.views.remove(v);
            }
            None => self.views.clear(),
        }
    }

    // === Embeddings ===

    pub fn embedding_status(&self) -> MemnetResult<EmbeddingStatus> {
        let nodes = self.store.load_nodes()?;
        let embeddings = self.store.load_embeddings()?;
        Ok(EmbeddingStatus {
            nodes: nodes.len(),
            embeddings: embeddings.len(),
            dimension: embeddings.first().map(Vec::len),
            views: self.store.list_views()?,
        })
    }

    /// Re-embed every node's content and replace the embedding table.
    ///
    /// Nothing is written unless every batch succeeds.
    pub async fn rebuild_embeddings(&self) -> MemnetResult<usize> {
        let nodes = self.store.load_nodes()?;
        if nodes.is_empty() {
            return Err(MemnetError::EmptyNodeSet);
        }
        let embedder = self.embedder()?;
        let texts: Vec<String> = nodes.iter().map(|n| n.content.clone()).collect();
        let cfg = &self.config.embedding;

        let embeddings = embed_all(embedder, &texts, cfg.batch_size, cfg.batch_delay())
            .await
            .map_err(|e| {
                error!(error = %e, nodes = nodes.len(), "re-embedding failed");
                e
            })?;
        self.store.save_embeddings(&embeddings)?;
        self.invalidate(None);
        info!(count = embeddings.len(), "embeddings rebuilt");
        Ok(embeddings.len())
    }

    // === Building ===

    /// General (non-hub) nodes and the similarity matrix over them
    fn prepare(&self, similarity: SimilaritySource, needs_matrix: bool) -> MemnetResult<(Vec<Node>, SimilarityMatrix)> {
        let hub_session = self.config.hub.session.as_str();
        let nodes = self.store.load_nodes()?;
        if nodes.is_empty() {
            return Err(MemnetError::EmptyNodeSet);
        }

        if !needs_matrix {
            let general: Vec<Node> = nodes.into_iter().filter(|n| !n.in_session(hub_session)).collect();
            return Ok((general, SimilarityMatrix::zeros(0)));
        }

        match similarity {
            SimilaritySource::Embedding => {
                let embeddings = self.store.load_embeddings()?;
                if embeddings.len() != nodes.len() {
                    return Err(MemnetError::EmbeddingMismatch {
                        nodes: nodes.len(),
                        embeddings: embeddings.len(),
                    });
                }
                let (general, vectors): (Vec<Node>, Vec<Vec<f32>>) = nodes
                    .into_iter()
                    .zip(embeddings)
                    .filter(|(n, _)| !n.in_session(hub_session))
                    .unzip();
                let matrix = SimilarityMatrix::from_embeddings(&vectors);
                Ok((general, matrix))
            }
            SimilaritySource::Tfidf => {
                let general: Vec<Node> = nodes.into_iter().filter(|n| !n.in_session(hub_session)).collect();
                let texts: Vec<String> = general.iter().map(Node::searchable_text).collect();
                let matrix = SimilarityMatrix::from_texts(&texts, self.config.graph.tfidf_max_df);
                Ok((general, matrix))
            }
        }
    }

    fn build_and_save(&self, nodes: &[Node], matrix: &SimilarityMatrix, spec: &ViewSpec) -> MemnetResult<TopologyStats> {
        let builder = GraphBuilder::new(nodes, matrix).with_alpha(self.config.graph.alpha);
        let graph = builder.build(spec)?;
        let built_at = Utc::now();
        let stats = TopologyStats::compute(&graph, &self.config.topology, &self.config.gate)
            .with_view(*spec)
            .with_built_at(built_at);

        let name = spec.name();
        let record = GraphRecord {
            view: name.clone(),
            built_at: Some(built_at),
            edges: graph.edges().to_vec(),
        };
        self.store.save_graph(&record)?;
        self.store.save_stats(&name, &stats)?;
        self.invalidate(Some(&name));

        info!(
            view = %name,
            nodes = stats.num_nodes,
            edges = stats.num_edges,
            gate_pass = stats.gate_pass,
            "view built"
        );
        Ok(stats)
    }

    /// Build one view over the general nodes and persist graph and stats.
    pub fn build_view(&self, spec: &ViewSpec, similarity: SimilaritySource) -> MemnetResult<TopologyStats> {
        let needs_matrix = spec.method != BuildMethod::Cooccurrence;
        let (nodes, matrix) = self.prepare(similarity, needs_matrix)?;
        self.build_and_save(&nodes, &matrix, spec)
    }

    /// Build k-NN, co-occurrence and fusion views for every `k` and save
    /// the summary.
    pub fn sweep(&self, ks: &[usize], similarity: SimilaritySource) -> MemnetResult<Vec<TopologyStats>> {
        let (nodes, matrix) = self.prepare(similarity, true)?;
        let alpha = self.config.graph.alpha;
        let mut summary = Vec::with_capacity(ks.len() * 3);
        for &k in ks {
            if k == 0 {
                return Err(BuildError::InvalidView(format!("k must be positive, got {}", k)).into());
            }
            for spec in [ViewSpec::knn(k), ViewSpec::cooccurrence(k), ViewSpec::fusion(k, alpha)] {
                summary.push(self.build_and_save(&nodes, &matrix, &spec)?);
            }
        }
        self.store.save_summary(&summary)?;
        info!(views = summary.len(), passing = summary.iter().filter(|s| s.gate_pass).count(), "sweep done");
        Ok(summary)
    }

    pub fn view_stats(&self, view: &str) -> MemnetResult<TopologyStats> {
        let name = canonical_view(view)?;
        self.store
            .load_stats(&name)?
            .ok_or(MemnetError::ViewNotFound(name))
    }

    /// Load a view over the full node list, from cache when possible.
    pub fn load_view(&self, view: &str) -> MemnetResult<Arc<Graph>> {
        let name = canonical_view(view)?;
        if let Some(graph) = self.views.get(&name) {
            return Ok(Arc::clone(graph.value()));
        }
        let record = self
            .store
            .load_graph(&name)?
            .ok_or_else(|| MemnetError::ViewNotFound(name.clone()))?;
        let nodes = self.store.load_nodes()?;
        let graph = Arc::new(Graph::from_parts(nodes, record.edges)?);
        debug!(view = %name, edges = graph.edge_count(), "view loaded");
        self.views.insert(name, Arc::clone(&graph));
        Ok(graph)
    }

    // === Retrieval ===

    async fn seeds(&self, request: &QueryRequest, nodes: &[Node], k: usize) -> MemnetResult<(ActivationMap, SeedSource)> {
        if !request.keywords.is_empty() {
            return Ok((keyword_seeds(nodes, request.keywords.as_slice()), SeedSource::Keyword));
        }
        let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok((ActivationMap::new(), SeedSource::Empty));
        };

        let embeddings = self.store.load_embeddings()?;
        if !embeddings.is_empty() && embeddings.len() != nodes.len() {
            return Err(MemnetError::EmbeddingMismatch {
                nodes: nodes.len(),
                embeddings: embeddings.len(),
            });
        }

        let query_vector = match (&self.embedder, embeddings.first()) {
            (None, _) => Err("no embedding provider configured".to_string()),
            (Some(_), None) => Err("no stored embeddings".to_string()),
            (Some(embedder), Some(first)) => match embedder.embed(text).await {
                Ok(v) if v.len() == first.len() => Ok(v),
                Ok(v) => Err(format!("query dimension {} != stored dimension {}", v.len(), first.len())),
                Err(e) => Err(e.to_string()),
            },
        };

        match query_vector {
            Ok(v) => Ok((embedding_seeds(&v, nodes, &embeddings, k), SeedSource::Embedding)),
            Err(reason) => {
                warn!(%reason, "no query vector, seeding with TF-IDF");
                Ok((tfidf_seeds(text, nodes, k), SeedSource::Tfidf))
            }
        }
    }

    /// Views to serve and whether they came from the config.
    fn resolve_views(&self, request: &QueryRequest) -> MemnetResult<(Vec<String>, bool)> {
        let (names, configured) = if !request.views.is_empty() {
            (&request.views, false)
        } else if !self.config.activation.views.is_empty() {
            (&self.config.activation.views, true)
        } else {
            return Ok((vec![canonical_view(&self.config.graph.primary_view)?], true));
        };
        let views = names.iter().map(|v| canonical_view(v)).collect::<MemnetResult<_>>()?;
        Ok((views, configured))
    }

    fn view_gates(&self, views: &[String]) -> MemnetResult<Vec<ViewGate>> {
        views
            .iter()
            .map(|view| {
                let gate_pass = self.store.load_stats(view)?.map(|stats| self.config.gate.evaluate(&stats));
                Ok(ViewGate {
                    view: view.clone(),
                    gate_pass,
                })
            })
            .collect()
    }

    /// First view of the sweep summary that passes the gate
    fn first_passing_view(&self) -> MemnetResult<Option<String>> {
        Ok(self
            .store
            .load_summary()?
            .iter()
            .filter(|stats| self.config.gate.evaluate(stats))
            .find_map(|stats| stats.view.map(|v| v.name())))
    }

    /// Apply the gate to a single served view.
    ///
    /// Several views are fused and served as asked. A single configured
    /// view that fails is swapped for the first passing view of the sweep
    /// summary; a single requested view is served with a warning.
    fn gate_views(&self, views: Vec<String>, configured: bool) -> MemnetResult<(Vec<String>, Vec<ViewGate>)> {
        let gates = self.view_gates(&views)?;
        if views.len() != 1 || gates[0].gate_pass != Some(false) {
            return Ok((views, gates));
        }
        if configured {
            if let Some(passing) = self.first_passing_view()? {
                info!(failing = %views[0], serving = %passing, "configured view fails the gate");
                let views = vec![passing];
                let gates = self.view_gates(&views)?;
                return Ok((views, gates));
            }
        }
        warn!(view = %views[0], "serving a view that fails the gate");
        Ok((views, gates))
    }

    /// Seed, spread through every requested view, fuse, and rank.
    pub async fn query(&self, request: &QueryRequest) -> MemnetResult<QueryResponse> {
        let cfg = &self.config.activation;
        let fusion = FusionConfig {
            kind: request.fusion.unwrap_or(cfg.fusion.kind),
            ..cfg.fusion.clone()
        };
        let spread = SpreadingActivation {
            hops: request.hops.unwrap_or(cfg.spread.hops),
            decay: request.decay.unwrap_or(cfg.spread.decay),
            ..cfg.spread.clone()
        };
        let (views, configured) = self.resolve_views(request)?;
        let (views, gates) = self.gate_views(views, configured)?;

        let nodes = self.store.load_nodes()?;
        if nodes.is_empty() {
            return Err(MemnetError::EmptyNodeSet);
        }
        let (seeds, seed_source) = self.seeds(request, &nodes, request.seeds.unwrap_or(cfg.seeds)).await?;

        let mut maps = Vec::with_capacity(views.len());
        for view in &views {
            let graph = self.load_view(view)?;
            maps.push(spread.activate(&graph, &seeds));
        }
        let merged = fusion.fuse_all(maps);
        let results = merged.extract(&nodes, request.top_n.unwrap_or(cfg.top_n));

        debug!(
            seeds = seeds.len(),
            views = views.len(),
            activated = merged.len(),
            source = %seed_source,
            "query done"
        );
        Ok(QueryResponse {
            seed_source,
            seeds: seeds.ranked(),
            views,
            gates,
            fusion: fusion.kind,
            results,
        })
    }

    // === Evaluation ===

    /// Run `scenarios` over the swept views and save the contexts.
    ///
    /// Sources: every view of the sweep summary that passes the gate; each
    /// two-view fusion strategy over the k-NN and co-occurrence views of
    /// every swept `k`, whatever their gate verdict; an empty baseline; and
    /// a seeded random baseline drawn from the first passing view.
    pub fn evaluate(&self, scenarios: &[Scenario]) -> MemnetResult<Evaluation> {
        let summary = self.store.load_summary()?;
        if summary.is_empty() {
            return Err(MemnetError::NoSummary);
        }
        let cfg = &self.config.activation;
        let top_n = cfg.top_n;
        let passing: Vec<String> = summary
            .iter()
            .filter(|stats| self.config.gate.evaluate(stats))
            .filter_map(|stats| stats.view.map(|v| v.name()))
            .collect();
        if passing.is_empty() {
            warn!(views = summary.len(), "no view passes the gate; only fusion and baselines run");
        }

        let mut eval = Evaluation::default();

        for view in &passing {
            let graph = self.load_view(view)?;
            let label = format!("single/{}", view);
            for scenario in scenarios {
                let seeds = keyword_seeds(graph.nodes(), scenario.seed_keywords.as_slice());
                let activation = cfg.spread.activate(&graph, &seeds);
                eval.record(&label, scenario, activation.extract(graph.nodes(), top_n));
            }
            eval.single += 1;
        }

        let knn_ks: BTreeSet<usize> = summary
            .iter()
            .filter_map(|s| s.view)
            .filter(|v| v.method == BuildMethod::Knn)
            .map(|v| v.k)
            .collect();
        let paired_ks = summary
            .iter()
            .filter_map(|s| s.view)
            .filter(|v| v.method == BuildMethod::Cooccurrence && knn_ks.contains(&v.k))
            .map(|v| v.k)
            .collect::<BTreeSet<usize>>();
        let kinds = [FusionKind::Union, FusionKind::IntersectionBoost, FusionKind::Weighted];

        for k in paired_ks {
            let knn = self.load_view(&ViewSpec::knn(k).name())?;
            let cooc = self.load_view(&ViewSpec::cooccurrence(k).name())?;
            for scenario in scenarios {
                let seeds = keyword_seeds(knn.nodes(), scenario.seed_keywords.as_slice());
                let semantic = cfg.spread.activate(&knn, &seeds);
                let local = cfg.spread.activate(&cooc, &seeds);
                for kind in kinds {
                    let fusion = FusionConfig { kind, ..cfg.fusion.clone() };
                    let fused = fusion.fuse_all(vec![semantic.clone(), local.clone()]);
                    eval.record(&format!("fusion-{}/k{}", kind, k), scenario, fused.extract(knn.nodes(), top_n));
                }
            }
            eval.fusion += kinds.len();
        }

        for scenario in scenarios {
            eval.record(EMPTY_BASELINE, scenario, Vec::new());
        }
        eval.baselines += 1;

        if let Some(first) = passing.first() {
            let graph = self.load_view(first)?;
            let picks = random_baseline(graph.nodes(), scenarios, top_n, RANDOM_BASELINE_SEED);
            for (scenario, nodes) in scenarios.iter().zip(picks) {
                eval.record(RANDOM_BASELINE, scenario, nodes);
            }
            eval.baselines += 1;
        }

        self.store.save_contexts(&eval.contexts)?;
        info!(
            scenarios = scenarios.len(),
            single = eval.single,
            fusion = eval.fusion,
            baselines = eval.baselines,
            "evaluation saved"
        );
        Ok(eval)
    }

    // === Hubs ===

    /// Replace the identity hubs on the primary view.
    ///
    /// With `dry_run` the result is computed and reported but not saved.
    pub async fn inject_hubs(&self, hub_k: Option<usize>, dry_run: bool) -> MemnetResult<HubInjection> {
        let view = canonical_view(&self.config.graph.primary_view)?;
        let (nodes, embeddings) = self.load_aligned()?;
        let record = self
            .store
            .load_graph(&view)?
            .ok_or_else(|| MemnetError::ViewNotFound(view.clone()))?;
        let graph = Graph::from_parts(nodes, record.edges)?;

        let mut hub_config = self.config.hub.clone();
        if let Some(k) = hub_k {
            hub_config.hub_k = k;
        }
        for def in &hub_config.definitions {
            if def.content.trim().is_empty() {
                return Err(StorageError::InvalidRecord("hub definition with empty content".to_string()).into());
            }
        }

        let injection = hub::inject(graph, embeddings, self.embedder()?, &hub_config, &self.config.topology).await?;

        if dry_run {
            info!("dry run, nothing saved");
            return Ok(injection);
        }
        self.store.save_nodes(injection.nodes())?;
        self.store.save_embeddings(&injection.embeddings)?;
        self.store.save_graph(&GraphRecord {
            view: view.clone(),
            built_at: Some(Utc::now()),
            edges: injection.graph.edges().to_vec(),
        })?;
        self.invalidate(None);
        Ok(injection)
    }
}

/// Normalize `knn:12` to `knn__k12`
fn canonical_view(view: &str) -> MemnetResult<String> {
    Ok(view.parse::<ViewSpec>()?.name())
}
