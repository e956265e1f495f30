//! Writing the graph to its output artifact
//!
//! The output path's extension selects the format. `dot`/`gv` write the DOT
//! source, `json` writes a snapshot of nodes and edges, and every other
//! extension is handed to Graphviz as `dot -T<format>`.
//!
//! Artifacts are written to a temporary file next to the destination and
//! renamed into place only once complete, so a failed render leaves no
//! partial file behind.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::dot::render_dot;
use crate::graph::{RankDir, RevisionGraph, RevisionNode};
use crate::{Error, Result};

/// Default Graphviz executable
pub const DEFAULT_DOT_BINARY: &str = "dot";

/// Where and in which format the graph is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Output path without its extension
    pub base: PathBuf,
    /// Extension without the leading dot
    pub format: String,
}

impl OutputTarget {
    /// Split an output path into base path and format
    ///
    /// # Errors
    /// `MissingOutputExtension` when the path has no extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| Error::MissingOutputExtension {
                path: path.to_path_buf(),
            })?;

        Ok(OutputTarget {
            base: path.with_extension(""),
            format,
        })
    }

    /// Graph name: the output file stem
    pub fn name(&self) -> String {
        self.base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Final artifact path, `base.format`
    pub fn path(&self) -> PathBuf {
        let mut file_name = self.base.as_os_str().to_owned();
        file_name.push(".");
        file_name.push(&self.format);
        PathBuf::from(file_name)
    }
}

/// Renderer settings
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Graphviz executable used for image formats
    pub dot_binary: OsString,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            dot_binary: OsString::from(DEFAULT_DOT_BINARY),
        }
    }
}

/// Serializable view of a graph, written for the `json` format
#[derive(Debug, Serialize)]
pub struct GraphSnapshot<'a> {
    pub name: String,
    pub rank_dir: RankDir,
    pub nodes: Vec<NodeSnapshot<'a>>,
    pub edges: Vec<EdgeSnapshot<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NodeSnapshot<'a> {
    #[serde(flatten)]
    pub node: &'a RevisionNode,
    pub shape: &'static str,
    pub peripheries: u8,
}

/// Edge between node ids, with the readable identity keys alongside
#[derive(Debug, Serialize)]
pub struct EdgeSnapshot<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub from_key: &'a str,
    pub to_key: &'a str,
}

impl<'a> GraphSnapshot<'a> {
    pub fn new(graph: &'a RevisionGraph, name: String) -> Self {
        GraphSnapshot {
            name,
            rank_dir: graph.rank_dir(),
            nodes: graph
                .nodes()
                .map(|node| NodeSnapshot {
                    node,
                    shape: node.shape().as_str(),
                    peripheries: node.peripheries(),
                })
                .collect(),
            edges: graph
                .edge_ids()
                .into_iter()
                .zip(graph.edge_keys())
                .map(|((from, to), (from_key, to_key))| EdgeSnapshot {
                    from,
                    to,
                    from_key,
                    to_key,
                })
                .collect(),
        }
    }
}

/// Render `graph` to `target`, returning the written path
pub fn render(graph: &RevisionGraph, target: &OutputTarget, config: &RendererConfig) -> Result<PathBuf> {
    let name = target.name();
    let bytes = match target.format.as_str() {
        "dot" | "gv" => render_dot(graph, &name).into_bytes(),
        "json" => serde_json::to_vec_pretty(&GraphSnapshot::new(graph, name))?,
        format => run_graphviz(&render_dot(graph, &name), format, config)?,
    };

    let path = target.path();
    write_atomic(&path, &bytes)?;

    tracing::info!(
        path = %path.display(),
        format = %target.format,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "wrote graph"
    );

    Ok(path)
}

/// Pipe DOT source through Graphviz and capture the rendered bytes
fn run_graphviz(source: &str, format: &str, config: &RendererConfig) -> Result<Vec<u8>> {
    let program = config.dot_binary.to_string_lossy().into_owned();
    tracing::debug!(%program, format, "invoking graphviz");

    let mut child = Command::new(&config.dot_binary)
        .arg(format!("-T{format}"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::RendererUnavailable {
            program: program.clone(),
            source,
        })?;

    // Graphviz may exit before reading all of stdin. Reap the child anyway so
    // its exit status and stderr take precedence over the broken pipe.
    let write_result = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(source.as_bytes()),
        None => Ok(()),
    };

    let output = child
        .wait_with_output()
        .map_err(|err| Error::io(&program, err))?;

    if !output.status.success() {
        return Err(Error::RenderFailed {
            format: format.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    write_result.map_err(|err| Error::io(&program, err))?;

    Ok(output.stdout)
}

/// Write `bytes` to `path` through a temporary file in the same directory
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
    let mut tmp_file = NamedTempFile::new_in(dir).map_err(|err| Error::io(dir, err))?;
    tmp_file
        .write_all(bytes)
        .map_err(|err| Error::io(tmp_file.path(), err))?;
    tmp_file
        .persist(path)
        .map_err(|err| Error::io(path, err.error))?;

    Ok(())
}
