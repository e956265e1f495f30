//! Python declaration reader using tree-sitter
//!
//! Walks the top-level statements of a module and converts assignments into
//! [`Declaration`]s. Nested scopes are never visited.

use std::path::Path;

use tree_sitter::{Node, Parser as TsParser};

use super::{Declaration, Expr, Target};

/// Parse Python source and return its top-level declarations in source order
pub fn parse_declarations(
    parser: &mut TsParser,
    source: &str,
    path: &Path,
) -> crate::Result<Vec<Declaration>> {
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| crate::Error::malformed(path, "failed to parse Python source"))?;

    let root_node = tree.root_node();
    if root_node.has_error() {
        let line = first_error_line(&root_node).map_or(0, |row| row + 1);
        return Err(crate::Error::malformed(
            path,
            format!("invalid Python syntax near line {line}"),
        ));
    }

    let source_bytes = source.as_bytes();
    let mut declarations = Vec::new();
    let mut cursor = root_node.walk();

    // Only iterate over direct children of root (top-level statements)
    for statement in root_node.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }

        let mut inner_cursor = statement.walk();
        for expression in statement.named_children(&mut inner_cursor) {
            if expression.kind() == "assignment" {
                if let Some(declaration) = read_assignment(&expression, source_bytes) {
                    declarations.push(declaration);
                }
            }
        }
    }

    Ok(declarations)
}

/// Convert an `assignment` node, following chained assignments
///
/// Returns `None` for annotations without a value (`x: int`).
fn read_assignment(node: &Node, source: &[u8]) -> Option<Declaration> {
    let mut targets = Vec::new();
    let mut current = *node;

    loop {
        let left = current.child_by_field_name("left")?;
        targets.push(read_target(&left, source));

        let right = current.child_by_field_name("right")?;
        if right.kind() == "assignment" {
            current = right;
            continue;
        }

        return Some(Declaration {
            targets,
            value: read_expr(&right, source),
            line: node.start_position().row,
        });
    }
}

fn read_target(node: &Node, source: &[u8]) -> Target {
    match node.kind() {
        "identifier" => match node.utf8_text(source) {
            Ok(name) => Target::Name(name.to_string()),
            Err(_) => Target::Other("identifier".to_string()),
        },
        kind => Target::Other(kind.to_string()),
    }
}

fn read_expr(node: &Node, source: &[u8]) -> Expr {
    match node.kind() {
        "none" => Expr::None,
        "string" => read_string(node, source),
        "concatenated_string" => {
            let mut joined = String::new();
            for part in named_children(node) {
                match read_string(&part, source) {
                    Expr::Str(text) => joined.push_str(&text),
                    _ => return Expr::Other("concatenated_string".to_string()),
                }
            }
            Expr::Str(joined)
        }
        "tuple" | "expression_list" => Expr::Tuple(read_items(node, source)),
        "list" => Expr::List(read_items(node, source)),
        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) => read_expr(inner, source),
            None => Expr::Other("parenthesized_expression".to_string()),
        },
        kind => Expr::Other(kind.to_string()),
    }
}

fn read_items(node: &Node, source: &[u8]) -> Vec<Expr> {
    named_children(node)
        .iter()
        .map(|child| read_expr(child, source))
        .collect()
}

/// Named children without comments
fn named_children<'tree>(node: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Decode a string literal node's full text, prefix and quotes included
fn read_string(node: &Node, source: &[u8]) -> Expr {
    let Ok(text) = node.utf8_text(source) else {
        return Expr::Other("string".to_string());
    };

    let prefix_len = text
        .find(|c: char| c == '"' || c == '\'')
        .unwrap_or(text.len());
    let prefix = text[..prefix_len].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') || prefix.contains('t') {
        return Expr::Other(if prefix.contains('b') { "bytes" } else { "f-string" }.to_string());
    }

    let quoted = &text[prefix_len..];
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < quote_len * 2 {
        return Expr::Other("string".to_string());
    }

    let body = &quoted[quote_len..quoted.len() - quote_len];
    if prefix.contains('r') {
        Expr::Str(body.to_string())
    } else {
        Expr::Str(unescape(body))
    }
}

/// Decode Python backslash escapes; unknown escapes are kept verbatim
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == width => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(digit @ '0'..='7') => {
                let mut value = digit.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|next| next.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn first_error_line(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}
