//! Scenario evaluation
//!
//! A scenario is a canned query with its seed keywords. Evaluation runs
//! every scenario through each gate-passing view, through each fusion
//! strategy over the k-NN and co-occurrence views of the same `k`, and
//! through two baselines (no context, and a seeded random sample). The
//! resulting contexts are saved so they can be compared side by side.

use crate::activation::ActivatedNode;
use crate::config::ConfigError;
use crate::graph::Node;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Score given to every node of the random baseline
pub const RANDOM_BASELINE_SCORE: f64 = 0.5;

/// RNG seed of the random baseline
pub const RANDOM_BASELINE_SEED: u64 = 42;

pub const EMPTY_BASELINE: &str = "baseline/empty";
pub const RANDOM_BASELINE: &str = "baseline/random";

/// A canned query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// The user turn the scenario stands for
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub seed_keywords: Vec<String>,
}

impl Scenario {
    pub fn new<I, S>(id: impl Into<String>, input: impl Into<String>, seed_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            input: input.into(),
            description: None,
            seed_keywords: seed_keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a YAML list of scenarios
    pub fn from_yaml(raw: &str) -> Result<Vec<Self>, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load_all(path: &Path) -> Result<Vec<Self>, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }
}

/// What one activation source retrieved for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub scenario_input: String,
    pub activated_nodes: Vec<ActivatedNode>,
    pub num_activated: usize,
}

impl ScenarioContext {
    pub fn new(scenario: &Scenario, activated_nodes: Vec<ActivatedNode>) -> Self {
        Self {
            scenario_input: scenario.input.clone(),
            num_activated: activated_nodes.len(),
            activated_nodes,
        }
    }
}

/// Source label (`single/knn__k12`, `fusion-union/k12`, ...) → scenario id → context
pub type ContextTable = BTreeMap<String, BTreeMap<String, ScenarioContext>>;

/// Contexts of one evaluation run, with per-kind counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub contexts: ContextTable,
    pub single: usize,
    pub fusion: usize,
    pub baselines: usize,
}

impl Evaluation {
    pub(crate) fn record(&mut self, label: &str, scenario: &Scenario, nodes: Vec<ActivatedNode>) {
        self.contexts
            .entry(label.to_string())
            .or_default()
            .insert(scenario.id.clone(), ScenarioContext::new(scenario, nodes));
    }

    /// One line per source: label and the top three contents per scenario
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (label, contexts) in &self.contexts {
            out.push_str(&format!("--- {} ---\n", label));
            for (id, ctx) in contexts {
                let top: Vec<String> = ctx
                    .activated_nodes
                    .iter()
                    .take(3)
                    .map(|n| format!("{}({:.2})", n.content.chars().take(40).collect::<String>(), n.score))
                    .collect();
                out.push_str(&format!("  {}: {} -> {}\n", id, ctx.num_activated, top.join(", ")));
            }
        }
        out.push_str(&format!(
            "{} sources: {} single, {} fusion, {} baseline\n",
            self.contexts.len(),
            self.single,
            self.fusion,
            self.baselines
        ));
        out
    }
}

/// Every scenario gets `n` nodes drawn from one RNG seeded once, each
/// scored `RANDOM_BASELINE_SCORE`.
pub fn random_baseline(nodes: &[Node], scenarios: &[Scenario], n: usize, seed: u64) -> Vec<Vec<ActivatedNode>> {
    let mut rng = StdRng::seed_from_u64(seed);
    scenarios
        .iter()
        .map(|_| {
            nodes
                .choose_multiple(&mut rng, n.min(nodes.len()))
                .map(|node| ActivatedNode {
                    id: node.id.clone(),
                    score: RANDOM_BASELINE_SCORE,
                    content: node.content.clone(),
                    node_type: node.node_type.clone(),
                    session: node.session.clone(),
                    context_hint: node.context_hint.clone(),
                })
                .collect()
        })
        .collect()
}
