//! Graph assembly tests with persisted-shape fixtures

use super::*;
use serde_json::json;

fn node_fixture(id: &str, session: Option<&str>) -> Node {
    let node = Node::new(id, format!("memory {}", id), NodeType::Fact);
    match session {
        Some(s) => node.with_session(s),
        None => node,
    }
}

fn edge(a: &str, b: &str, w: f64) -> Edge {
    Edge::new(a.into(), b.into(), w, EdgeMethod::Knn).unwrap()
}

#[test]
fn nodes_deserialize_from_persisted_shape() {
    let raw = json!([
        {"id": "n0001", "content": "prefers short answers", "type": "intention", "session": "2026-02-22-s3"},
        {"id": "n0002", "content": "works on the search service", "type": "fact", "keywords": ["search", "latency"]}
    ]);
    let nodes: Vec<Node> = serde_json::from_value(raw).unwrap();
    assert_eq!(nodes[0].node_type, NodeType::Intention);
    assert_eq!(nodes[0].session.as_deref(), Some("2026-02-22-s3"));
    assert_eq!(nodes[1].keywords, vec!["search", "latency"]);
}

#[test]
fn duplicate_node_ids_are_rejected() {
    let err = Graph::new(vec![node_fixture("n0001", None), node_fixture("n0001", None)]).unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode("n0001".into()));
}

#[test]
fn dangling_edges_are_rejected() {
    let err = Graph::from_parts(vec![node_fixture("n0001", None)], vec![edge("n0001", "n0002", 0.5)]).unwrap_err();
    assert!(matches!(err, GraphError::DanglingEdge { .. }));
}

#[test]
fn duplicate_pair_keeps_max_weight() {
    let nodes = vec![node_fixture("n0001", None), node_fixture("n0002", None)];
    let graph = Graph::from_parts(
        nodes,
        vec![edge("n0001", "n0002", 0.4), edge("n0002", "n0001", 0.7), edge("n0001", "n0002", 0.5)],
    )
    .unwrap();

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.edge_weight(&"n0002".into(), &"n0001".into()), Some(0.7));
}

#[test]
fn adjacency_is_symmetric() {
    let nodes = vec![node_fixture("n0001", None), node_fixture("n0002", None), node_fixture("n0003", None)];
    let graph = Graph::from_parts(nodes, vec![edge("n0001", "n0002", 0.4), edge("n0002", "n0003", 0.9)]).unwrap();
    let adj = graph.adjacency();

    assert_eq!(adj.degree(0), 1);
    assert_eq!(adj.degree(1), 2);
    assert_eq!(adj.neighbors(2), &[(1, 0.9)]);
}

#[test]
fn removing_nodes_drops_their_edges_and_reports_positions() {
    let nodes = vec![
        node_fixture("n0001", None),
        node_fixture("n0002", Some("identity")),
        node_fixture("n0003", None),
    ];
    let mut graph = Graph::from_parts(
        nodes,
        vec![edge("n0001", "n0002", 0.4), edge("n0001", "n0003", 0.6), edge("n0002", "n0003", 0.3)],
    )
    .unwrap();

    let removed = graph.remove_nodes_where(|n| n.in_session("identity"));

    assert_eq!(removed, vec![1]);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.index_of(&"n0003".into()), Some(1));
    assert_eq!(graph.edge_weight(&"n0001".into(), &"n0003".into()), Some(0.6));
}

#[test]
fn max_sequence_ignores_foreign_ids() {
    let graph = Graph::new(vec![node_fixture("n0007", None), node_fixture("custom", None)]).unwrap();
    assert_eq!(graph.max_sequence(), 7);
    assert_eq!(Graph::default().max_sequence(), 0);
}
