//! Error type shared by every stage of the pipeline.
//!
//! Every variant is fatal: the driver stops at the first one and no output
//! artifact is written.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading migration scripts or producing the graph.
#[derive(Debug, Error)]
pub enum Error {
    /// The script has no usable `revision` declaration
    #[error("unable to read file {}: unable to find revision identifier", .file.name_only())]
    MissingIdentifier { file: PathBuf },

    /// The script's declarations have an unexpected shape
    #[error("unable to read file {}: {reason}", .file.name_only())]
    MalformedMetadata { file: PathBuf, reason: String },

    /// A version directory argument does not name a directory
    #[error("'{}' is not a directory", .path.display())]
    DirectoryNotFound { path: PathBuf },

    /// `--dir-labels` count differs from the number of version directories
    #[error(
        "you must provide exactly one directory label for each version directory \
         (want: {expected}, got: {got})"
    )]
    LabelCountMismatch { expected: usize, got: usize },

    /// The output path carries no extension to select a format from
    #[error("output file path must contain an extension (e.g. '.png'): '{}'", .path.display())]
    MissingOutputExtension { path: PathBuf },

    /// Filesystem failure on a specific path
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failure
    #[error("error walking directory '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// Invalid glob used for file discovery
    #[error("invalid discovery pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// The tree-sitter grammar could not be loaded
    #[error("failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The Graphviz executable could not be started
    #[error("unable to run '{program}' (is Graphviz installed?): {source}")]
    RendererUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The Graphviz executable exited unsuccessfully
    #[error("rendering to '{format}' failed ({status}): {stderr}")]
    RenderFailed {
        format: String,
        status: String,
        stderr: String,
    },

    /// JSON snapshot serialization failure
    #[error("failed to serialize graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(file: &Path, reason: impl Into<String>) -> Self {
        Error::MalformedMetadata {
            file: file.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Diagnostics name scripts by file name, not by full path.
trait NameOnly {
    fn name_only(&self) -> String;
}

impl NameOnly for PathBuf {
    fn name_only(&self) -> String {
        self.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display().to_string())
    }
}
