//! Loading revisions from version directories
//!
//! Loading is fail-fast: the first script that cannot be read aborts the
//! whole directory, and the error names the offending file.

use std::path::Path;

use crate::discovery;
use crate::extract::extract_revision;
use crate::parser::Parser;
use crate::revision::Revision;
use crate::{Error, Result};

/// Read every migration script in `dir`
///
/// # Returns
/// Revisions in discovery order
///
/// # Errors
/// `DirectoryNotFound` when `dir` is not a directory, otherwise the first
/// parse or extraction failure.
pub fn load_revisions(dir: &Path) -> Result<Vec<Revision>> {
    let mut parser = Parser::new()?;
    load_revisions_with(&mut parser, dir)
}

/// Same as [`load_revisions`], reusing an existing parser
pub fn load_revisions_with(parser: &mut Parser, dir: &Path) -> Result<Vec<Revision>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let files = discovery::discover_migration_scripts(dir)?;
    let mut revisions = Vec::with_capacity(files.len());

    for file in &files {
        let declarations = parser.parse_file(file)?;
        revisions.push(extract_revision(&declarations, file)?);
    }

    tracing::info!(
        dir = %dir.display(),
        revisions = revisions.len(),
        "loaded version directory"
    );

    Ok(revisions)
}

/// Load each directory in order, one revision group per directory
pub fn load_groups<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<Vec<Revision>>> {
    let mut parser = Parser::new()?;
    dirs.iter()
        .map(|dir| load_revisions_with(&mut parser, dir.as_ref()))
        .collect()
}
