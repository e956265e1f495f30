//! DOT source generation for revision graphs.

use std::fmt::Write;

use crate::graph::{RankDir, RevisionGraph};

/// Escape special characters for quoted DOT strings.
pub fn escape(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// A DOT graph builder that quotes every identifier.
pub struct DotBuilder {
    output: String,
}

impl DotBuilder {
    /// Start a new digraph with the given name.
    pub fn new(name: &str) -> Self {
        let mut output = String::with_capacity(4096);
        let _ = writeln!(output, "digraph \"{}\" {{", escape(name));
        Self { output }
    }

    /// Add a graph attribute.
    pub fn graph_attr(&mut self, key: &str, value: &str) -> &mut Self {
        let _ = writeln!(self.output, "  graph [{}=\"{}\"];", key, escape(value));
        self
    }

    /// Add a node with attributes.
    pub fn node(&mut self, id: &str, attrs: &[(&str, &str)]) -> &mut Self {
        let _ = write!(self.output, "  \"{}\"", escape(id));
        write_attrs(&mut self.output, attrs);
        self.output.push_str(";\n");
        self
    }

    /// Add an edge.
    pub fn edge(&mut self, from: &str, to: &str) -> &mut Self {
        let _ = writeln!(self.output, "  \"{}\" -> \"{}\";", escape(from), escape(to));
        self
    }

    /// Finish building and return the DOT string.
    pub fn build(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}

fn write_attrs(output: &mut String, attrs: &[(&str, &str)]) {
    if attrs.is_empty() {
        return;
    }
    output.push_str(" [");
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            output.push_str(", ");
        }
        let _ = write!(output, "{}=\"{}\"", key, escape(value));
    }
    output.push(']');
}

/// Render a revision graph as DOT source.
pub fn render_dot(graph: &RevisionGraph, name: &str) -> String {
    let mut dot = DotBuilder::new(name);

    if graph.rank_dir() == RankDir::BottomToTop {
        dot.graph_attr("rankdir", graph.rank_dir().as_str());
    }

    for node in graph.nodes() {
        let peripheries = node.peripheries().to_string();
        dot.node(
            &node.id,
            &[
                ("label", node.label.as_str()),
                ("shape", node.shape().as_str()),
                ("peripheries", peripheries.as_str()),
            ],
        );
    }

    for (from, to) in graph.edge_ids() {
        dot.edge(from, to);
    }

    dot.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::BuildOptions;
    use crate::revision::Revision;

    fn revisions() -> Vec<Revision> {
        vec![
            Revision::new("a", vec![None], "v/0001_initial.py"),
            Revision::new("b", vec![Some("a".to_string())], "v/0002_users.py"),
            Revision::new("c", vec![Some("a".to_string())], "v/0003_posts.py"),
            Revision::new(
                "m",
                vec![Some("b".to_string()), Some("c".to_string())],
                "v/0004_merge.py",
            ),
        ]
    }

    #[test]
    fn test_render_forward() {
        let graph = RevisionGraph::build(&revisions(), BuildOptions::default());

        let dot = render_dot(&graph, "output");

        assert_eq!(
            dot,
            "digraph \"output\" {\n\
             \x20 \"r0\" [label=\"0001_initial\", shape=\"oval\", peripheries=\"2\"];\n\
             \x20 \"r1\" [label=\"0002_users\", shape=\"oval\", peripheries=\"1\"];\n\
             \x20 \"r2\" [label=\"0003_posts\", shape=\"oval\", peripheries=\"1\"];\n\
             \x20 \"r3\" [label=\"0004_merge\", shape=\"box\", peripheries=\"1\"];\n\
             \x20 \"r1\" -> \"r0\";\n\
             \x20 \"r2\" -> \"r0\";\n\
             \x20 \"r3\" -> \"r1\";\n\
             \x20 \"r3\" -> \"r2\";\n\
             }\n"
        );
    }

    #[test]
    fn test_render_reverse_sets_rankdir() {
        let options = BuildOptions {
            reverse: true,
            ..Default::default()
        };
        let graph = RevisionGraph::build(&revisions(), options);

        let dot = render_dot(&graph, "output");

        assert!(dot.contains("graph [rankdir=\"BT\"];"));
        assert!(dot.contains("\"r0\" -> \"r1\";"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut revs = vec![Revision::new("a\"q", vec![None], "v/x.py")];
        revs[0].group_labels = vec!["prod".to_string()];
        let graph = RevisionGraph::build(
            &revs,
            BuildOptions {
                short_node_labels: true,
                ..Default::default()
            },
        );

        let dot = render_dot(&graph, "my graph");

        assert!(dot.starts_with("digraph \"my graph\" {"));
        assert!(dot.contains("label=\"a\\\"q\\nprod\""));
    }

    #[test]
    fn test_lookalike_keys_get_separate_statements() {
        let revs = vec![
            Revision::new("x", vec![Some("a".to_string()), Some("b".to_string())], "v/x1.py"),
            Revision::new("x", vec![Some("a+b".to_string())], "v/x2.py"),
            Revision::new("y", vec![None], "v/y1.py"),
            Revision::new("y", vec![Some("None".to_string())], "v/y2.py"),
        ];
        let graph = RevisionGraph::build(&revs, BuildOptions::default());

        let dot = render_dot(&graph, "output");

        let statements: Vec<_> = dot.lines().filter(|line| line.contains("[label=")).collect();
        assert_eq!(statements.len(), 4);
        for (id, stem) in [("r0", "x1"), ("r1", "x2"), ("r2", "y1"), ("r3", "y2")] {
            assert!(dot.contains(&format!("\"{id}\" [label=\"{stem}\"")));
        }
    }
}
