//! Parser module for reading declarations out of migration scripts
//!
//! Migration scripts are Python modules. This module uses tree-sitter to
//! read their top-level assignments into a small, language-neutral
//! [`Declaration`] model without executing anything.
//!
//! # Restricted Value Model
//!
//! Assigned values are converted into [`Expr`], which only knows string
//! literals, `None`, tuples and lists. Every other expression is kept as
//! [`Expr::Other`] carrying the tree-sitter node kind, so callers can reject
//! it with a useful message. This is all the revision extractor needs and
//! it keeps the parser free of any evaluation.

use std::path::Path;

pub mod python;

/// A top-level binding found in a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Bound targets, left to right (`a = b = v` has two)
    pub targets: Vec<Target>,
    /// Value on the right-hand side
    pub value: Expr,
    /// Zero-based source line of the statement
    pub line: usize,
}

impl Declaration {
    /// The single bound name, if this is a plain `name = value` binding
    pub fn single_name(&self) -> Option<&str> {
        match self.targets.as_slice() {
            [Target::Name(name)] => Some(name),
            _ => None,
        }
    }
}

/// The left-hand side of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A bare identifier
    Name(String),
    /// Attribute, subscript or unpacking target, with its node kind
    Other(String),
}

/// Restricted literal expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// String literal, after prefix handling, escapes and concatenation
    Str(String),
    /// The `None` constant
    None,
    /// Tuple display, including bare `a, b` expression lists
    Tuple(Vec<Expr>),
    /// List display
    List(Vec<Expr>),
    /// Anything else, tagged with its node kind
    Other(String),
}

impl Expr {
    /// Short description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Expr::Str(_) => "string".to_string(),
            Expr::None => "None".to_string(),
            Expr::Tuple(_) => "tuple".to_string(),
            Expr::List(_) => "list".to_string(),
            Expr::Other(kind) => kind.replace('_', " "),
        }
    }
}

/// Reusable parser for migration scripts
///
/// Holds the tree-sitter parser so that a directory of scripts is parsed
/// without reloading the grammar for every file.
pub struct Parser {
    inner: tree_sitter::Parser,
}

impl Parser {
    /// Create a new parser with the Python grammar loaded
    pub fn new() -> crate::Result<Self> {
        let mut inner = tree_sitter::Parser::new();
        inner.set_language(&tree_sitter_python::LANGUAGE.into())?;
        Ok(Parser { inner })
    }

    /// Read a script from disk and return its top-level declarations
    pub fn parse_file(&mut self, path: &Path) -> crate::Result<Vec<Declaration>> {
        let source =
            std::fs::read_to_string(path).map_err(|err| crate::Error::io(path, err))?;
        self.parse_source(&source, path)
    }

    /// Parse script text; `path` is only used for diagnostics
    pub fn parse_source(&mut self, source: &str, path: &Path) -> crate::Result<Vec<Declaration>> {
        python::parse_declarations(&mut self.inner, source, path)
    }
}
