//! Tree-sitter wrapper for Rust sources.

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use crate::error::GenError;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("language error: {0}")]
    Language(String),
    #[error("parse failed")]
    ParseFailed,
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

pub struct RustParser {
    parser: Parser,
}

impl RustParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| ParseError::Language(format!("{e}")))?;
        Ok(Self { parser })
    }

    /// Parses `source`, rejecting sources with syntax errors.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        let tree = self
            .parser
            .parse(source.as_bytes(), None)
            .ok_or(ParseError::ParseFailed)?;
        if let Some(bad) = first_error(tree.root_node()) {
            let pos = bad.start_position();
            return Err(ParseError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
            });
        }
        Ok(tree)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found.or(Some(node))
}

/// A parsed source file.
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    tree: Tree,
}

impl SourceFile {
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Result<Self, GenError> {
        let path = path.into();
        let tree = RustParser::new()
            .and_then(|mut p| p.parse(&source))
            .map_err(|source| GenError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, source, tree })
    }

    pub fn read(path: &Path) -> Result<Self, GenError> {
        let source = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, source)
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.source.as_bytes())
    }
}

pub fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    source
        .get(node.byte_range())
        .and_then(|b| std::str::from_utf8(b).ok())
        .unwrap_or("")
}

/// Named children of `node`, skipping comments.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !matches!(c.kind(), "line_comment" | "block_comment"))
        .collect()
}

/// Collapses whitespace runs so multi-line type text renders on one line.
pub fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
