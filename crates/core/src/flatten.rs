//! Merging revision groups into one deduplicated set
//!
//! Each input directory yields one group. Revisions with the same
//! [`IdentityKey`] collapse into the first-seen instance, which collects the
//! label of every group that contained it.

use std::collections::HashMap;

use crate::revision::{IdentityKey, Revision};
use crate::{Error, Result};

/// Flatten `groups` into unique revisions in first-seen order
///
/// # Arguments
/// * `groups` - One revision list per input directory, in argument order
/// * `labels` - Optional group labels; must hold one label per group
///
/// # Errors
/// `LabelCountMismatch` when `labels` is given with the wrong length.
pub fn flatten_groups(groups: Vec<Vec<Revision>>, labels: Option<&[String]>) -> Result<Vec<Revision>> {
    if let Some(labels) = labels {
        check_label_count(groups.len(), labels.len())?;
    }

    let mut index_by_identity: HashMap<IdentityKey, usize> = HashMap::new();
    let mut flattened: Vec<Revision> = Vec::new();

    for (group_index, group) in groups.into_iter().enumerate() {
        for revision in group {
            let position = *index_by_identity
                .entry(revision.identity())
                .or_insert_with(|| {
                    flattened.push(revision);
                    flattened.len() - 1
                });

            if let Some(labels) = labels {
                flattened[position].group_labels.push(labels[group_index].clone());
            }
        }
    }

    tracing::info!(revisions = flattened.len(), "flattened revision groups");

    Ok(flattened)
}

/// Validate that one label was supplied per group
pub fn check_label_count(groups: usize, labels: usize) -> Result<()> {
    if groups != labels {
        return Err(Error::LabelCountMismatch {
            expected: groups,
            got: labels,
        });
    }
    Ok(())
}
