//! Revision graph construction
//!
//! Uses `petgraph::StableGraph` to hold one node per flattened revision and
//! one edge per resolved `down_revision` entry. Node styling is decided
//! here, from the revision classification, so the DOT writer only copies
//! attributes.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;

use crate::revision::{Revision, RevisionKind};

/// A node in the revision graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionNode {
    /// Renderer node id (`r0`, `r1`, ...), unique within the graph
    pub id: String,
    /// Readable identity key, e.g. `d4<-b2+c3`
    pub key: String,
    /// Revision identifier as declared in the script
    pub identifier: String,
    /// Display label, group labels on a second line
    pub label: String,
    /// Structural classification
    pub kind: RevisionKind,
    /// Group labels accumulated during flattening
    pub group_labels: Vec<String>,
}

impl RevisionNode {
    /// Node shape: merges are boxes
    pub fn shape(&self) -> NodeShape {
        match self.kind {
            RevisionKind::Merge => NodeShape::Box,
            _ => NodeShape::Oval,
        }
    }

    /// Border count: initial revisions get a double border
    pub fn peripheries(&self) -> u8 {
        match self.kind {
            RevisionKind::Initial => 2,
            _ => 1,
        }
    }
}

/// Visual shape of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Oval,
    Box,
}

impl NodeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeShape::Oval => "oval",
            NodeShape::Box => "box",
        }
    }
}

/// An edge between a revision and one of its predecessors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionEdge {
    /// The `down_revision` entry this edge resolves
    pub down_revision: String,
}

/// Layout direction handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RankDir {
    /// Top to bottom; edges point from a revision down to its predecessor
    #[default]
    TopToBottom,
    /// Bottom to top; used with reversed edges so initial revisions stay at the bottom
    BottomToTop,
}

impl RankDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankDir::TopToBottom => "TB",
            RankDir::BottomToTop => "BT",
        }
    }
}

/// Graph construction switches
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Label nodes with identifiers instead of file stems
    pub short_node_labels: bool,
    /// Point edges from predecessor to revision
    pub reverse: bool,
}

/// The revision dependency graph
pub struct RevisionGraph {
    /// The underlying stable graph (private to enforce encapsulation)
    inner: StableGraph<RevisionNode, RevisionEdge>,
    rank_dir: RankDir,
}

impl RevisionGraph {
    /// Build the graph for a flattened revision set
    ///
    /// Every non-initial revision gets an edge for each `down_revision`
    /// entry and each revision carrying that identifier. Entries that match
    /// nothing are skipped; entries that match several revisions produce
    /// several edges.
    ///
    /// # Example
    /// ```
    /// use amgraph_core::graph::{BuildOptions, RevisionGraph};
    /// use amgraph_core::Revision;
    ///
    /// let revisions = vec![
    ///     Revision::new("a1", vec![None], "versions/0001_initial.py"),
    ///     Revision::new("b2", vec![Some("a1".to_string())], "versions/0002_users.py"),
    /// ];
    ///
    /// let graph = RevisionGraph::build(&revisions, BuildOptions::default());
    /// assert_eq!(graph.node_count(), 2);
    /// assert_eq!(graph.edge_count(), 1);
    /// ```
    pub fn build(revisions: &[Revision], options: BuildOptions) -> Self {
        let mut inner: StableGraph<RevisionNode, RevisionEdge> =
            StableGraph::with_capacity(revisions.len(), revisions.len());
        let mut by_identifier: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
        let mut indices = Vec::with_capacity(revisions.len());

        for (position, revision) in revisions.iter().enumerate() {
            let index = inner.add_node(node_for(revision, position, options.short_node_labels));
            by_identifier
                .entry(revision.identifier.as_str())
                .or_default()
                .push(index);
            indices.push(index);
        }

        for (revision, &index) in revisions.iter().zip(&indices) {
            if revision.is_initial() {
                continue;
            }

            for entry in revision.predecessors() {
                let Some(candidates) = by_identifier.get(entry) else {
                    tracing::debug!(
                        revision = %revision.identifier,
                        down_revision = entry,
                        "down revision not found, skipping edge"
                    );
                    continue;
                };

                for &candidate in candidates {
                    let (from, to) = if options.reverse {
                        (candidate, index)
                    } else {
                        (index, candidate)
                    };
                    inner.add_edge(
                        from,
                        to,
                        RevisionEdge {
                            down_revision: entry.to_string(),
                        },
                    );
                }
            }
        }

        let rank_dir = if options.reverse {
            RankDir::BottomToTop
        } else {
            RankDir::TopToBottom
        };

        RevisionGraph { inner, rank_dir }
    }

    pub fn rank_dir(&self) -> RankDir {
        self.rank_dir
    }

    /// Get a node by index
    pub fn node_weight(&self, index: NodeIndex) -> Option<&RevisionNode> {
        self.inner.node_weight(index)
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &RevisionNode> {
        self.inner.node_weights()
    }

    /// Iterate over edges as `(from, to, weight)` in insertion order
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &RevisionEdge)> {
        self.inner
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Edges as `(from id, to id)` pairs
    pub fn edge_ids(&self) -> Vec<(&str, &str)> {
        self.edge_pairs(|node| node.id.as_str())
    }

    /// Edges as `(from key, to key)` pairs
    pub fn edge_keys(&self) -> Vec<(&str, &str)> {
        self.edge_pairs(|node| node.key.as_str())
    }

    fn edge_pairs<'a>(&'a self, field: impl Fn(&'a RevisionNode) -> &'a str) -> Vec<(&'a str, &'a str)> {
        self.edge_endpoints()
            .filter_map(|(from, to, _)| {
                let from = self.node_weight(from)?;
                let to = self.node_weight(to)?;
                Some((field(from), field(to)))
            })
            .collect()
    }
}

/// Node ids come from the position in the flattened set, so they stay
/// distinct even when two identity keys read the same.
fn node_for(revision: &Revision, position: usize, short_node_labels: bool) -> RevisionNode {
    let mut label = if short_node_labels {
        revision.identifier.clone()
    } else {
        revision.file_stem()
    };
    if !revision.group_labels.is_empty() {
        label.push('\n');
        label.push_str(&revision.group_labels.join(", "));
    }

    RevisionNode {
        id: format!("r{position}"),
        key: revision.identity().to_string(),
        identifier: revision.identifier.clone(),
        label,
        kind: revision.kind(),
        group_labels: revision.group_labels.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(identifier: &str, down: &[Option<&str>]) -> Revision {
        Revision::new(
            identifier,
            down.iter().map(|d| d.map(str::to_string)).collect(),
            format!("versions/{identifier}_script.py"),
        )
    }

    fn node<'a>(graph: &'a RevisionGraph, identifier: &str) -> &'a RevisionNode {
        graph
            .nodes()
            .find(|n| n.identifier == identifier)
            .expect("node should exist")
    }

    /// a <- b <- d, a <- c <- d (merge)
    fn diamond() -> Vec<Revision> {
        vec![
            rev("a", &[None]),
            rev("b", &[Some("a")]),
            rev("c", &[Some("a")]),
            rev("d", &[Some("b"), Some("c")]),
        ]
    }

    #[test]
    fn test_node_styling_follows_classification() {
        let graph = RevisionGraph::build(&diamond(), BuildOptions::default());

        let initial = node(&graph, "a");
        let normal = node(&graph, "b");
        let merge = node(&graph, "d");

        assert_eq!((initial.peripheries(), initial.shape()), (2, NodeShape::Oval));
        assert_eq!((normal.peripheries(), normal.shape()), (1, NodeShape::Oval));
        assert_eq!((merge.peripheries(), merge.shape()), (1, NodeShape::Box));
    }

    #[test]
    fn test_edges_point_to_predecessors() {
        let graph = RevisionGraph::build(&diamond(), BuildOptions::default());

        assert_eq!(graph.rank_dir(), RankDir::TopToBottom);
        assert_eq!(
            graph.edge_keys(),
            vec![
                ("b<-a", "a<-None"),
                ("c<-a", "a<-None"),
                ("d<-b+c", "b<-a"),
                ("d<-b+c", "c<-a"),
            ]
        );
    }

    #[test]
    fn test_reverse_flips_edges_and_pins_initial_to_bottom() {
        let options = BuildOptions {
            reverse: true,
            ..Default::default()
        };
        let graph = RevisionGraph::build(&diamond(), options);

        assert_eq!(graph.rank_dir(), RankDir::BottomToTop);
        assert_eq!(graph.edge_keys()[0], ("a<-None", "b<-a"));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_dangling_reference_is_silent() {
        let revisions = vec![rev("b", &[Some("missing")]), rev("c", &[Some("b")])];

        let graph = RevisionGraph::build(&revisions, BuildOptions::default());

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_keys(), vec![("c<-b", "b<-missing")]);
    }

    #[test]
    fn test_duplicate_identifiers_produce_multi_edges() {
        let revisions = vec![
            rev("x", &[Some("a")]),
            rev("x", &[Some("b")]),
            rev("y", &[Some("x")]),
        ];

        let graph = RevisionGraph::build(&revisions, BuildOptions::default());

        assert_eq!(
            graph.edge_keys(),
            vec![("y<-x", "x<-a"), ("y<-x", "x<-b")]
        );
    }

    #[test]
    fn test_labels() {
        let mut revisions = vec![rev("a", &[None])];
        revisions[0].group_labels = vec!["prod".to_string(), "dev".to_string()];

        let long = RevisionGraph::build(&revisions, BuildOptions::default());
        let short = RevisionGraph::build(
            &revisions,
            BuildOptions {
                short_node_labels: true,
                ..Default::default()
            },
        );

        assert_eq!(node(&long, "a").label, "a_script\nprod, dev");
        assert_eq!(node(&short, "a").label, "a\nprod, dev");
    }

    #[test]
    fn test_node_ids_distinct_for_lookalike_keys() {
        let revisions = vec![
            rev("x", &[Some("a"), Some("b")]),
            rev("x", &[Some("a+b")]),
            rev("y", &[None]),
            rev("y", &[Some("None")]),
        ];

        let graph = RevisionGraph::build(&revisions, BuildOptions::default());

        let ids: std::collections::HashSet<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(
            graph.nodes().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["r0", "r1", "r2", "r3"]
        );
        // Keys render the same, ids do not
        let keys: Vec<_> = graph.nodes().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["x<-a+b", "x<-a+b", "y<-None", "y<-None"]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edge_ids_use_node_ids() {
        let graph = RevisionGraph::build(&diamond(), BuildOptions::default());

        assert_eq!(
            graph.edge_ids(),
            vec![("r1", "r0"), ("r2", "r0"), ("r3", "r1"), ("r3", "r2")]
        );
        assert_eq!(node(&graph, "d").key, "d<-b+c");
    }
}
