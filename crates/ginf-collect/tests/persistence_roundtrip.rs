use std::collections::BTreeMap;

use ginf_collect::EdgeCollector;
use ginf_graph::Multigraph;
use tempfile::tempdir;

fn populated_collector(epsilon: f64) -> EdgeCollector {
    let mut collector = EdgeCollector::new(epsilon);
    let multi = Multigraph::from_edge_list(4, &[(0, 1, 3), (2, 2, 1)]).unwrap();
    let simple = Multigraph::from_edge_list(4, &[(0, 1, 1), (1, 3, 1)]).unwrap();
    let mut extra = BTreeMap::new();
    extra.insert("sweep".to_string(), serde_json::json!(12));
    extra.insert("tag".to_string(), serde_json::json!("burned"));
    collector.update(&simple);
    collector.update_and_keep(&multi, Some(-4.125), extra);
    collector.update_and_keep(&simple, None, BTreeMap::new());
    collector
}

#[test]
fn json_file_round_trip_is_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("collector.json");
    let collector = populated_collector(0.05);
    collector.save(&path).unwrap();

    let restored = EdgeCollector::from_path(&path, 0.05).unwrap();
    assert_eq!(restored, collector);

    let mut reloaded = EdgeCollector::new(0.05);
    reloaded.load(&path).unwrap();
    assert_eq!(reloaded, collector);
}

#[test]
fn load_keeps_the_current_epsilon() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("collector.json");
    populated_collector(0.05).save(&path).unwrap();
    let mut other = EdgeCollector::new(0.2);
    other.load(&path).unwrap();
    assert_eq!(other.epsilon(), 0.2);
    assert_eq!(other.total_count(), 3);
}

#[test]
fn byte_round_trip_is_exact() {
    let collector = populated_collector(0.0);
    let bytes = collector.to_bytes().unwrap();
    assert_eq!(EdgeCollector::from_bytes(&bytes, 0.0).unwrap(), collector);
}

#[test]
fn inconsistent_records_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{"multiplicities":[[0,1,[[1,2]]]],"counts":[[0,1,5]],"total_count":5,"node_count":2,"graph_collection":[]}"#,
    )
    .unwrap();
    let err = EdgeCollector::from_path(&path, 0.0).unwrap_err();
    assert_eq!(err.info().code, "collector-record-invalid");

    let missing = EdgeCollector::from_path(&dir.path().join("absent.json"), 0.0).unwrap_err();
    assert_eq!(missing.info().code, "collector-read");
}

#[test]
fn non_finite_scores_survive_both_formats() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scores.json");
    let graph = Multigraph::from_edge_list(3, &[(0, 1, 1)]).unwrap();
    let mut collector = EdgeCollector::new(0.0);
    collector.update_and_keep(&graph, Some(f64::NEG_INFINITY), BTreeMap::new());
    collector.update_and_keep(&graph, Some(f64::INFINITY), BTreeMap::new());
    collector.update_and_keep(&graph, Some(f64::NAN), BTreeMap::new());
    collector.save(&path).unwrap();

    let from_json = EdgeCollector::from_path(&path, 0.0).unwrap();
    let from_bytes = EdgeCollector::from_bytes(&collector.to_bytes().unwrap(), 0.0).unwrap();
    for restored in [from_json, from_bytes] {
        let scores: Vec<Option<f64>> = restored.graph_collection().iter().map(|entry| entry.score).collect();
        assert_eq!(scores[0], Some(f64::NEG_INFINITY));
        assert_eq!(scores[1], Some(f64::INFINITY));
        assert!(scores[2].is_some_and(f64::is_nan));
        assert_eq!(restored.graph_collection()[0], collector.graph_collection()[0]);
    }
}
