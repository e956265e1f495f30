//! Revision extraction from parsed declarations
//!
//! Only plain single-target bindings are honored. Chained bindings such as
//! `revision = alias = "x"` are skipped without error; a single target that
//! is not a bare name is malformed.

use std::path::Path;

use crate::parser::{Declaration, Expr, Target};
use crate::revision::Revision;
use crate::{Error, Result};

const REVISION: &str = "revision";
const DOWN_REVISION: &str = "down_revision";

/// Build a [`Revision`] from a script's declarations
///
/// When a name is bound several times the last binding wins.
pub fn extract_revision(declarations: &[Declaration], source_file: &Path) -> Result<Revision> {
    let mut identifier: Option<&Expr> = None;
    let mut down_revision: Option<&Expr> = None;

    for declaration in declarations {
        let [target] = declaration.targets.as_slice() else {
            continue;
        };

        let name = match target {
            Target::Name(name) => name.as_str(),
            Target::Other(kind) => {
                return Err(Error::malformed(
                    source_file,
                    format!(
                        "unsupported assignment target ({}) on line {}",
                        kind.replace('_', " "),
                        declaration.line + 1
                    ),
                ));
            }
        };

        match name {
            REVISION => identifier = Some(&declaration.value),
            DOWN_REVISION => down_revision = Some(&declaration.value),
            _ => {}
        }
    }

    let identifier = match identifier {
        Some(Expr::Str(value)) if !value.is_empty() => value.clone(),
        Some(Expr::Str(_)) | Some(Expr::None) | None => {
            return Err(Error::MissingIdentifier {
                file: source_file.to_path_buf(),
            });
        }
        Some(other) => {
            return Err(Error::malformed(
                source_file,
                format!("`{REVISION}` must be a string, found {}", other.describe()),
            ));
        }
    };

    let down_revisions = normalize_down_revision(down_revision, source_file)?;

    tracing::debug!(
        file = %source_file.display(),
        %identifier,
        ?down_revisions,
        "extracted revision"
    );

    Ok(Revision::new(identifier, down_revisions, source_file))
}

/// Absent or `None` becomes `[None]`, a string becomes `[Some(s)]`, and
/// sequences are kept entry by entry.
fn normalize_down_revision(value: Option<&Expr>, source_file: &Path) -> Result<Vec<Option<String>>> {
    match value {
        None | Some(Expr::None) => Ok(vec![None]),
        Some(Expr::Str(value)) => Ok(vec![Some(value.clone())]),
        Some(Expr::Tuple(items)) | Some(Expr::List(items)) => items
            .iter()
            .map(|item| match item {
                Expr::Str(value) => Ok(Some(value.clone())),
                Expr::None => Ok(None),
                other => Err(Error::malformed(
                    source_file,
                    format!(
                        "`{DOWN_REVISION}` entries must be strings, found {}",
                        other.describe()
                    ),
                )),
            })
            .collect(),
        Some(other) => Err(Error::malformed(
            source_file,
            format!(
                "`{DOWN_REVISION}` must be a string, None or a sequence, found {}",
                other.describe()
            ),
        )),
    }
}
