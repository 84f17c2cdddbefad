//! tree-sitter wrapper for Go source.

use tree_sitter::{Node, Parser, Tree};

use crate::build::TreeBuilder;
use crate::error::{Result, SyntaxError};
use crate::tree::File;

/// Go parser producing either raw tree-sitter trees or full-fidelity [`File`]s.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new parser with the Go grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parse source code and return the syntax tree, which may contain errors.
    pub fn parse_tree(&mut self, source: &str) -> Result<Tree> {
        self.parser.parse(source, None).ok_or(SyntaxError::NoTree)
    }

    /// Parse source code, failing on the first syntax error.
    pub fn parse_valid(&mut self, source: &str) -> Result<Tree> {
        let tree = self.parse_tree(source)?;
        if let Some(err) = first_error(tree.root_node()) {
            return Err(err);
        }
        Ok(tree)
    }

    /// Parse source code into the full-fidelity tree.
    pub fn parse_file(&mut self, source: &str) -> Result<File> {
        let tree = self.parse_valid(source)?;
        TreeBuilder::new(source).file(tree.root_node())
    }
}

/// Locate the first error or missing node, depth first.
pub fn first_error(root: Node<'_>) -> Option<SyntaxError> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return Some(SyntaxError::invalid(
                node.start_position(),
                format!("missing {}", node.kind()),
            ));
        }
        if node.is_error() {
            return Some(SyntaxError::invalid(node.start_position(), "unexpected input"));
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        // Push in reverse order for depth-first traversal
        stack.extend(children.into_iter().rev());
    }
    Some(SyntaxError::invalid(root.start_position(), "unexpected input"))
}
