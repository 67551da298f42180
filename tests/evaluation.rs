//! Scenario evaluation over swept views

mod common;

use common::embedded_engine;
use memnet::evaluate::{EMPTY_BASELINE, RANDOM_BASELINE, RANDOM_BASELINE_SCORE};
use memnet::{GateThresholds, MemnetConfig, Scenario, SimilaritySource};

const SCENARIOS: &str = r#"
- id: latency
  input: "search feels slow again"
  seed_keywords: [search, latency]
- id: tea
  input: "what should I drink?"
  description: drink preferences
  seed_keywords: [tea]
"#;

fn scenarios() -> Vec<Scenario> {
    Scenario::from_yaml(SCENARIOS).unwrap()
}

// === Scenario: no view passes the default gate on a small corpus ===
#[tokio::test]
async fn fusion_and_empty_baseline_run_without_passing_views() {
    let (dir, engine) = embedded_engine(MemnetConfig::default()).await;
    let summary = engine.sweep(&[2, 3], SimilaritySource::Embedding).unwrap();
    assert!(summary.iter().all(|s| !s.gate_pass));

    let eval = engine.evaluate(&scenarios()).unwrap();
    assert_eq!(eval.single, 0);
    assert_eq!(eval.fusion, 6);
    assert_eq!(eval.baselines, 1);
    assert!(eval.contexts.contains_key("fusion-union/k2"));
    assert!(eval.contexts.contains_key("fusion-intersection_boost/k3"));
    assert!(eval.contexts.contains_key("fusion-weighted/k3"));
    assert!(!eval.contexts.contains_key(RANDOM_BASELINE));
    assert!(eval.contexts[EMPTY_BASELINE].values().all(|c| c.num_activated == 0));

    let tea = &eval.contexts["fusion-union/k3"]["tea"];
    assert_eq!(tea.scenario_input, "what should I drink?");
    assert_eq!(tea.activated_nodes[0].score, 1.0);
    assert!(tea.activated_nodes[0].content.contains("tea"));

    assert!(dir.path().join("networks/conversation_contexts.json").is_file());
    assert_eq!(engine.store().load_contexts().unwrap(), eval.contexts);
}

// === Scenario: every view passes a permissive gate ===
#[tokio::test]
async fn passing_views_and_random_baseline_are_evaluated() {
    let mut config = MemnetConfig::default();
    config.gate = GateThresholds {
        max_hop1_ratio: 1.0,
        min_avg_path: -1.0,
        min_giant_ratio: 0.0,
    };
    let (dir, engine) = embedded_engine(config).await;
    engine.sweep(&[3], SimilaritySource::Embedding).unwrap();

    let path = dir.path().join("scenarios.yaml");
    std::fs::write(&path, SCENARIOS).unwrap();
    let scenarios = Scenario::load_all(&path).unwrap();

    let eval = engine.evaluate(&scenarios).unwrap();
    assert_eq!(eval.single, 3);
    assert_eq!(eval.fusion, 3);
    assert_eq!(eval.baselines, 2);

    let single = &eval.contexts["single/knn__k3"];
    assert_eq!(single.len(), 2);
    assert!(single["tea"].activated_nodes[0].content.contains("tea"));
    assert!(eval.contexts.contains_key("single/cooc__k3"));
    assert!(eval.contexts.contains_key("single/fusion__k3"));

    // ten nodes, so the random sample is capped below top_n
    let random = &eval.contexts[RANDOM_BASELINE];
    assert!(random.values().all(|c| c.num_activated == 10));
    assert!(random["latency"].activated_nodes.iter().all(|n| n.score == RANDOM_BASELINE_SCORE));
}
