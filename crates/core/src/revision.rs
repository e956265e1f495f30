//! Revision data model
//!
//! A [`Revision`] is one migration script: its identifier, the identifiers
//! it follows, and where it came from. Graph identity is the composite
//! [`IdentityKey`], not the raw identifier, so two scripts declaring the
//! same identifier with different predecessors stay distinct nodes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One migration unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Value of the `revision` declaration, never empty
    pub identifier: String,
    /// Normalized `down_revision`: `[None]` marks an initial revision
    pub down_revisions: Vec<Option<String>>,
    /// Script the revision was read from
    pub source_file: PathBuf,
    /// Labels of the input groups containing this revision, in group order
    pub group_labels: Vec<String>,
}

/// Structural classification of a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    /// No predecessor
    Initial,
    /// More than one predecessor
    Merge,
    /// Anything else
    Normal,
}

impl Revision {
    /// Create a revision with no group labels
    pub fn new(
        identifier: impl Into<String>,
        down_revisions: Vec<Option<String>>,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        Revision {
            identifier: identifier.into(),
            down_revisions,
            source_file: source_file.into(),
            group_labels: Vec::new(),
        }
    }

    /// Composite key used for deduplication and node addressing
    pub fn identity(&self) -> IdentityKey {
        let mut down_revisions = self.down_revisions.clone();
        down_revisions.sort();
        IdentityKey {
            identifier: self.identifier.clone(),
            down_revisions,
        }
    }

    /// True when the only predecessor entry is the "none" marker
    pub fn is_initial(&self) -> bool {
        matches!(self.down_revisions.as_slice(), [None])
    }

    pub fn is_merge(&self) -> bool {
        self.down_revisions.len() > 1
    }

    pub fn kind(&self) -> RevisionKind {
        if self.is_initial() {
            RevisionKind::Initial
        } else if self.is_merge() {
            RevisionKind::Merge
        } else {
            RevisionKind::Normal
        }
    }

    /// Predecessor identifiers, skipping "none" markers
    pub fn predecessors(&self) -> impl Iterator<Item = &str> {
        self.down_revisions.iter().filter_map(|entry| entry.as_deref())
    }

    /// Source file name without its extension
    pub fn file_stem(&self) -> String {
        file_stem(&self.source_file)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Identifier plus the order-insensitive predecessor set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    identifier: String,
    down_revisions: Vec<Option<String>>,
}

impl IdentityKey {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<-", self.identifier)?;
        for (i, entry) in self.down_revisions.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(entry.as_deref().unwrap_or("None"))?;
        }
        Ok(())
    }
}
