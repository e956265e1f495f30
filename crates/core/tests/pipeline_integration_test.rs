//! Integration tests for the load → flatten → build → render pipeline
//!
//! Fixtures live in `tests/test-fixtures/`:
//! - `prod/`: a1 ← b2, a1 ← c3, (b2, c3) ← d4 merge
//! - `dev/`: copies of a1 and b2, plus e5 following d4
//! - `broken/`: one valid script and one without a `revision`

use amgraph_core::graph::{BuildOptions, NodeShape, RevisionGraph};
use amgraph_core::{flatten, loader, Error, GraphOptions, RevisionKind};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new("tests/test-fixtures").join(name)
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_load_prod_fixture() {
    let revisions = loader::load_revisions(&fixture("prod")).unwrap();

    let ids: Vec<_> = revisions.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["a1", "b2", "c3", "d4"]);

    let kinds: Vec<_> = revisions.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            RevisionKind::Initial,
            RevisionKind::Normal,
            RevisionKind::Normal,
            RevisionKind::Merge
        ]
    );
}

#[test]
fn test_flatten_prod_and_dev() {
    let groups = loader::load_groups(&[fixture("prod"), fixture("dev")]).unwrap();
    let group_labels = labels(&["prod", "dev"]);

    let revisions = flatten::flatten_groups(groups, Some(&group_labels)).unwrap();

    let summary: Vec<_> = revisions
        .iter()
        .map(|r| (r.identifier.as_str(), r.group_labels.join("|")))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a1", "prod|dev".to_string()),
            ("b2", "prod|dev".to_string()),
            ("c3", "prod".to_string()),
            ("d4", "prod".to_string()),
            ("e5", "dev".to_string()),
        ]
    );
    // The first group's copy is the one kept
    assert!(revisions[0].source_file.starts_with(fixture("prod")));
}

#[test]
fn test_graph_for_prod_and_dev() {
    let groups = loader::load_groups(&[fixture("prod"), fixture("dev")]).unwrap();
    let revisions = flatten::flatten_groups(groups, None).unwrap();

    let graph = RevisionGraph::build(&revisions, BuildOptions::default());

    assert_eq!(graph.node_count(), 5);
    assert_eq!(
        graph.edge_keys(),
        vec![
            ("b2<-a1", "a1<-None"),
            ("c3<-a1", "a1<-None"),
            ("d4<-b2+c3", "c3<-a1"),
            ("d4<-b2+c3", "b2<-a1"),
            ("e5<-d4", "d4<-b2+c3"),
        ]
    );

    let merge = graph.nodes().find(|n| n.identifier == "d4").unwrap();
    assert_eq!(merge.shape(), NodeShape::Box);
    assert_eq!(merge.label, "0004_merge");
}

#[test]
fn test_dev_alone_has_dangling_reference() {
    let revisions = loader::load_revisions(&fixture("dev")).unwrap();

    let graph = RevisionGraph::build(&revisions, BuildOptions::default());

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_generate_dot_output() {
    let out_dir = TempDir::new().unwrap();
    let mut options = GraphOptions::new(vec![fixture("prod"), fixture("dev")]);
    options.dir_labels = Some(labels(&["prod", "dev"]));
    options.output = out_dir.path().join("history.dot");
    options.short_node_labels = true;
    options.reverse = true;

    let written = amgraph_core::generate(&options).unwrap();

    assert_eq!(written, out_dir.path().join("history.dot"));
    let dot = fs::read_to_string(&written).unwrap();
    assert!(dot.starts_with("digraph \"history\" {"));
    assert!(dot.contains("graph [rankdir=\"BT\"];"));
    assert!(dot.contains(
        "\"r0\" [label=\"a1\\nprod, dev\", shape=\"oval\", peripheries=\"2\"];"
    ));
    assert!(dot.contains("\"r0\" -> \"r1\";"));
}

#[test]
fn test_generate_fails_fast_without_output() {
    let out_dir = TempDir::new().unwrap();
    let mut options = GraphOptions::new(vec![fixture("prod"), fixture("broken")]);
    options.output = out_dir.path().join("history.dot");

    let err = amgraph_core::generate(&options).unwrap_err();

    assert!(matches!(err, Error::MissingIdentifier { .. }));
    assert!(err.to_string().contains("0002_no_revision.py"));
    assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_generate_validates_before_reading() {
    let mut options = GraphOptions::new(vec![fixture("prod"), fixture("does-not-exist")]);
    options.dir_labels = Some(labels(&["only-one"]));

    let mismatch = amgraph_core::generate(&options).unwrap_err();
    assert!(matches!(
        mismatch,
        Error::LabelCountMismatch {
            expected: 2,
            got: 1
        }
    ));

    options.dir_labels = None;
    options.output = PathBuf::from("graph");
    let no_extension = amgraph_core::generate(&options).unwrap_err();
    assert!(matches!(no_extension, Error::MissingOutputExtension { .. }));

    options.output = PathBuf::from("graph.dot");
    let missing_dir = amgraph_core::generate(&options).unwrap_err();
    assert!(matches!(missing_dir, Error::DirectoryNotFound { .. }));
}
