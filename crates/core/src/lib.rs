//! amgraph core library
//!
//! Builds a dependency graph of versioned migration scripts. Each script
//! declares its own `revision` and the `down_revision`(s) it follows; the
//! pipeline loads one revision group per version directory, merges the
//! groups, builds the graph and writes it out.
//!
//! ```text
//! version dirs -> loader -> flatten -> graph -> render
//! ```

pub mod discovery;
pub mod dot;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod graph;
pub mod loader;
pub mod parser;
pub mod render;
pub mod revision;

use std::path::PathBuf;

// Re-export commonly used types
pub use error::{Error, Result};
pub use graph::{BuildOptions, RevisionGraph};
pub use render::{OutputTarget, RendererConfig};
pub use revision::{IdentityKey, Revision, RevisionKind};

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Version directories, one revision group each
    pub version_dirs: Vec<PathBuf>,
    /// Optional label per version directory
    pub dir_labels: Option<Vec<String>>,
    /// Output artifact path; its extension selects the format
    pub output: PathBuf,
    /// Label nodes with identifiers instead of file names
    pub short_node_labels: bool,
    /// Reverse edge direction, keeping initial revisions at the bottom
    pub reverse: bool,
    pub renderer: RendererConfig,
}

impl GraphOptions {
    /// Options with defaults for everything but the inputs
    pub fn new(version_dirs: Vec<PathBuf>) -> Self {
        GraphOptions {
            version_dirs,
            dir_labels: None,
            output: PathBuf::from("output.png"),
            short_node_labels: false,
            reverse: false,
            renderer: RendererConfig::default(),
        }
    }
}

/// Run the whole pipeline and return the written artifact path
///
/// Argument checks happen before any file is read. Nothing is written
/// unless every script loads.
pub fn generate(options: &GraphOptions) -> Result<PathBuf> {
    if let Some(labels) = &options.dir_labels {
        flatten::check_label_count(options.version_dirs.len(), labels.len())?;
    }
    let target = OutputTarget::from_path(&options.output)?;

    let groups = loader::load_groups(&options.version_dirs)?;
    let revisions = flatten::flatten_groups(groups, options.dir_labels.as_deref())?;

    let graph = RevisionGraph::build(
        &revisions,
        BuildOptions {
            short_node_labels: options.short_node_labels,
            reverse: options.reverse,
        },
    );

    render::render(&graph, &target, &options.renderer)
}
