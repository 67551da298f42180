//! Hub injection against the persisted primary view

mod common;

use common::embedded_engine;
use memnet::{
    EdgeMethod, HubDefinition, MemnetConfig, MemnetError, NodeType, QueryRequest, SimilaritySource, ViewSpec,
};
use std::collections::HashSet;

fn config() -> MemnetConfig {
    let mut config = MemnetConfig::default();
    config.graph.primary_view = "knn__k3".to_string();
    config.hub.hub_k = 4;
    config.hub.definitions = vec![
        HubDefinition::new("I care about search latency in rust", NodeType::Intention, "identity/focus"),
        HubDefinition::new("my partner and I review graph work together", NodeType::Fact, "relationship"),
        HubDefinition::new("tea in the morning keeps me going", NodeType::Fact, "habits"),
    ];
    config
}

async fn prepared() -> (tempfile::TempDir, memnet::MemoryEngine) {
    let (dir, engine) = embedded_engine(config()).await;
    engine.build_view(&ViewSpec::knn(3), SimilaritySource::Embedding).unwrap();
    (dir, engine)
}

#[tokio::test]
async fn hubs_are_saved_with_aligned_embeddings() {
    let (_dir, engine) = prepared().await;
    let injection = engine.inject_hubs(None, false).await.unwrap();

    let ids: Vec<_> = injection.hub_ids.iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["n0011", "n0012", "n0013"]);

    let nodes = engine.store().load_nodes().unwrap();
    assert_eq!(nodes.len(), 13);
    assert_eq!(engine.store().load_embeddings().unwrap().len(), 13);
    assert!(nodes[10..].iter().all(|n| n.in_session("identity")));

    let graph = engine.load_view("knn__k3").unwrap();
    let hub = graph.index_of(&injection.hub_ids[0]).unwrap();
    assert!(graph.adjacency().degree(hub) >= 4);
    assert!(graph
        .edges()
        .iter()
        .filter(|e| e.touches(&injection.hub_ids[0]))
        .all(|e| e.method == EdgeMethod::HubKnn && e.weight >= 0.3));
}

#[tokio::test]
async fn running_twice_changes_nothing() {
    let (_dir, engine) = prepared().await;
    let first = engine.inject_hubs(None, false).await.unwrap();
    let edges_after_first = engine.load_view("knn__k3").unwrap().edge_count();

    let second = engine.inject_hubs(None, false).await.unwrap();
    assert_eq!(second.removed, 3);
    assert_eq!(second.hub_ids, first.hub_ids);
    assert_eq!(engine.store().load_nodes().unwrap().len(), 13);
    assert_eq!(engine.load_view("knn__k3").unwrap().edge_count(), edges_after_first);
}

#[tokio::test]
async fn dry_run_reports_but_does_not_write() {
    let (_dir, engine) = prepared().await;
    let before = engine.load_view("knn__k3").unwrap().edge_count();

    let injection = engine.inject_hubs(Some(2), true).await.unwrap();
    assert_eq!(injection.report.hub_count, 3);
    assert_eq!(injection.report.hubs.len(), 3);
    assert!(injection.report.hubs.iter().all(|h| h.degree == 2));
    assert!(injection.report.render().contains("[hubs] count=3"));

    assert_eq!(engine.store().load_nodes().unwrap().len(), 10);
    assert_eq!(engine.load_view("knn__k3").unwrap().edge_count(), before);
}

#[tokio::test]
async fn rebuilt_views_leave_hubs_out() {
    let (_dir, engine) = prepared().await;
    engine.inject_hubs(None, false).await.unwrap();
    // hub embeddings are in the table but hubs are not synthesized into views
    let stats = engine.build_view(&ViewSpec::knn(3), SimilaritySource::Embedding).unwrap();
    assert_eq!(stats.num_nodes, 10);
}

#[tokio::test]
async fn queries_reach_hubs() {
    let (_dir, engine) = prepared().await;
    engine.inject_hubs(None, false).await.unwrap();

    let response = engine
        .query(&QueryRequest::text("search latency").with_view("knn__k3"))
        .await
        .unwrap();
    let sessions: HashSet<_> = response.results.iter().filter_map(|r| r.session.clone()).collect();
    assert!(sessions.contains("identity"));
}

#[tokio::test]
async fn missing_primary_view_is_reported() {
    let (_dir, engine) = embedded_engine(config()).await;
    let err = engine.inject_hubs(None, false).await.unwrap_err();
    assert!(matches!(err, MemnetError::ViewNotFound(_)));
}
