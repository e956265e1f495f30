//! File discovery for version directories
//!
//! A version directory is scanned one level deep. Eligibility is expressed
//! as glob patterns matched against the file name: a file is a migration
//! script when it matches an include pattern and no exclude pattern.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Include/exclude patterns for migration scripts
#[derive(Debug, Clone)]
pub struct DiscoveryRules<'a> {
    /// File-name globs a script must match
    pub include: &'a [&'a str],
    /// File-name globs that disqualify a script (package markers)
    pub exclude: &'a [&'a str],
}

impl Default for DiscoveryRules<'static> {
    fn default() -> Self {
        DiscoveryRules {
            include: &["*.py"],
            exclude: &["__init__.py"],
        }
    }
}

/// Discover migration scripts directly inside `root`
///
/// # Arguments
/// * `root` - Version directory to scan (not recursed into)
/// * `rules` - Include/exclude file-name patterns
///
/// # Returns
/// Paths of the regular files that qualify, sorted by file name
///
/// # Example
/// ```no_run
/// use amgraph_core::discovery::{self, DiscoveryRules};
///
/// let scripts = discovery::discover_files(
///     std::path::Path::new("alembic/versions"),
///     &DiscoveryRules::default(),
/// )?;
/// println!("Found {} migration scripts", scripts.len());
/// # Ok::<(), amgraph_core::Error>(())
/// ```
pub fn discover_files(root: &Path, rules: &DiscoveryRules<'_>) -> Result<Vec<PathBuf>> {
    let include = build_glob_matcher(rules.include)?;
    let exclude = build_glob_matcher(rules.exclude)?;

    let mut files = Vec::new();

    for result in build_walker(root) {
        let entry = result.map_err(|source| Error::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let file_name = entry.file_name();
        if include.is_match(file_name) && !exclude.is_match(file_name) {
            tracing::debug!(path = %entry.path().display(), "discovered migration script");
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Discover Python migration scripts, skipping the package marker
///
/// # Example
/// ```no_run
/// use amgraph_core::discovery;
///
/// let scripts = discovery::discover_migration_scripts(std::path::Path::new("alembic/versions"))?;
/// # Ok::<(), amgraph_core::Error>(())
/// ```
pub fn discover_migration_scripts(root: &Path) -> Result<Vec<PathBuf>> {
    discover_files(root, &DiscoveryRules::default())
}

/// Build a glob matcher from the provided patterns
fn build_glob_matcher(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Build a single-level walker with every ignore filter turned off
///
/// Hidden files and `.gitignore`d files are still scripts. Symlinks are
/// followed so a linked script counts as a regular file.
fn build_walker(root: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .max_depth(Some(1))
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b));

    builder.build()
}
