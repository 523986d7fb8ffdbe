//! Go parser wrapper
//!
//! Uses tree-sitter-go crate’s LANGUAGE constant (converted via .into()).
//! A parse only succeeds for syntactically complete files; facts are never
//! extracted from a tree containing ERROR or MISSING nodes.

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{ParseError, ParseResult};

/// Owns a tree-sitter parser configured for Go.
///
/// Parsers are not shared between threads; create one per worker.
pub struct GoSourceParser {
    parser: Parser,
}

/// A parsed Go file together with the text its nodes point into
#[derive(Debug, Clone)]
pub struct GoSource {
    code: String,
    tree: Tree,
}

impl GoSource {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

impl GoSourceParser {
    /// Create a new Go parser
    pub fn new() -> ParseResult<Self> {
        let mut parser = Parser::new();
        let lang = tree_sitter_go::LANGUAGE;
        parser
            .set_language(&lang.into())
            .map_err(|e| ParseError::ParserInit {
                language: "Go".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { parser })
    }

    /// Parse Go source code, rejecting files with syntax errors
    pub fn parse(&mut self, code: &str) -> ParseResult<GoSource> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or_else(|| ParseError::SyntaxError {
                line: 0,
                column: 0,
                reason: "parser returned no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let (node, reason) = first_error(root, code)
                .unwrap_or_else(|| (root, "syntax error".to_string()));
            let position = node.start_position();
            debug!(
                "Rejecting Go source: {reason} at {}:{}",
                position.row + 1,
                position.column + 1
            );
            return Err(ParseError::SyntaxError {
                line: position.row as u32 + 1,
                column: position.column as u32 + 1,
                reason,
            });
        }

        debug!("Parsed Go source: {} bytes", code.len());
        Ok(GoSource {
            code: code.to_string(),
            tree,
        })
    }

    /// Parse raw file contents
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> ParseResult<GoSource> {
        let code = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
        self.parse(code)
    }
}

/// Depth-first search for the first ERROR or MISSING node
fn first_error<'tree>(node: Node<'tree>, code: &str) -> Option<(Node<'tree>, String)> {
    if node.is_missing() {
        return Some((node, format!("missing `{}`", node.kind())));
    }
    if node.is_error() {
        let text = code.get(node.byte_range()).unwrap_or_default();
        let snippet: String = text.lines().next().unwrap_or_default().chars().take(24).collect();
        return Some((node, format!("unexpected `{snippet}`")));
    }

    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.has_error())
        .find_map(|child| first_error(child, code))
}
