//! Byte-range source editing on top of a tree-sitter parse.
//!
//! Used for whole-file touch-ups after the tree has been printed, such as
//! dropping imports that no longer have any reference.

use std::ops::Range;

use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::error::{Result, SyntaxError};
use crate::imports::{ImportSpec, import_specs, unquote};
use crate::parser::{GoParser, first_error};

/// A pending replacement of a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub new_text: String,
}

impl Edit {
    pub fn delete(range: Range<usize>) -> Self {
        Self {
            range,
            new_text: String::new(),
        }
    }

    pub fn replace(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Source text plus its current parse.
pub struct SourceEditor {
    source: String,
    tree: Tree,
    parser: GoParser,
    edits: Vec<Edit>,
}

impl SourceEditor {
    /// Parse `source`. Syntax errors are kept in the tree, not reported.
    pub fn new(source: String) -> Result<Self> {
        let mut parser = GoParser::new()?;
        let tree = parser.parse_tree(&source)?;
        Ok(Self {
            source,
            tree,
            parser,
            edits: Vec::new(),
        })
    }

    pub fn get_source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// First syntax error of the current parse, if any.
    pub fn first_error(&self) -> Option<SyntaxError> {
        first_error(self.tree.root_node())
    }

    /// Apply all pending edits and re-parse.
    ///
    /// Edits must not overlap.
    pub fn apply_edits(&mut self) -> Result<()> {
        if self.edits.is_empty() {
            return Ok(());
        }

        let mut edits = std::mem::take(&mut self.edits);
        // Apply back to front so earlier offsets stay valid
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        for edit in edits {
            let end = edit.range.end.min(self.source.len());
            let start = edit.range.start.min(end);
            self.source.replace_range(start..end, &edit.new_text);
        }

        self.tree = self.parser.parse_tree(&self.source)?;
        Ok(())
    }

    /// Remove imports of any of `paths` that the file no longer references.
    ///
    /// Blank and dot imports are left alone. Returns the removed paths.
    pub fn prune_unused_imports(&mut self, paths: &[String]) -> Result<Vec<String>> {
        let (removed, edits) = self.plan_import_pruning(paths);
        self.edits.extend(edits);
        self.apply_edits()?;
        Ok(removed)
    }

    fn plan_import_pruning(&self, paths: &[String]) -> (Vec<String>, Vec<Edit>) {
        let root = self.tree.root_node();
        let mut removed = Vec::new();
        let mut edits = Vec::new();

        let mut cursor = root.walk();
        let decls: Vec<Node<'_>> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "import_declaration")
            .collect();

        for decl in decls {
            let specs = import_specs(decl);
            let mut doomed = Vec::new();
            for spec in &specs {
                let Some(path_node) = spec.child_by_field_name("path") else {
                    continue;
                };
                let path = unquote(&self.source[path_node.byte_range()]);
                if !paths.iter().any(|p| p == path) {
                    continue;
                }
                let name = spec
                    .child_by_field_name("name")
                    .map(|n| &self.source[n.byte_range()]);
                let Some(local) = ImportSpec::new(name, path).local_name() else {
                    continue;
                };
                if self.is_referenced(root, &local) {
                    continue;
                }
                debug!(path, local = local.as_str(), "pruning unused import");
                removed.push(path.to_string());
                doomed.push(*spec);
            }

            if doomed.is_empty() {
                continue;
            }
            if doomed.len() == specs.len() {
                edits.push(Edit::delete(self.line_span(decl.byte_range())));
            } else {
                edits.extend(
                    doomed
                        .iter()
                        .map(|spec| Edit::delete(self.line_span(spec.byte_range()))),
                );
            }
        }

        (removed, edits)
    }

    /// Whether any selector or qualified type outside the imports uses `local`.
    fn is_referenced(&self, root: Node<'_>, local: &str) -> bool {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "import_declaration" {
                continue;
            }
            let qualifier = match node.kind() {
                "selector_expression" => node.child_by_field_name("operand"),
                "qualified_type" => node.child_by_field_name("package"),
                _ => None,
            };
            if let Some(q) = qualifier {
                if &self.source[q.byte_range()] == local {
                    return true;
                }
            }
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }
        false
    }

    /// Widen `range` to whole lines when it is alone on its lines, and swallow
    /// one blank line if removing it would leave two in a row.
    fn line_span(&self, range: Range<usize>) -> Range<usize> {
        let bytes = self.source.as_bytes();
        let line_start = self.source[..range.start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        if !self.source[line_start..range.start].trim().is_empty() {
            return range;
        }

        let mut end = range.end;
        let rest = &self.source[end..];
        let line_rest = rest.find('\n').map(|i| &rest[..i]).unwrap_or(rest);
        let after = line_rest.trim_start();
        if !(after.is_empty() || after.starts_with("//")) {
            return range;
        }
        end += line_rest.len();
        if end < bytes.len() {
            end += 1;
        }

        let blank_before = line_start == 0
            || (line_start >= 2 && bytes[line_start - 1] == b'\n' && bytes[line_start - 2] == b'\n');
        if blank_before && end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        } else if blank_before && line_start > 0 && self.source[end..].trim_start().starts_with(')') {
            // Last spec of a group: drop the blank line above instead
            return line_start - 1..end;
        }
        line_start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTRUMENT: &str = "github.com/datadog/orchestrion/instrument";

    fn prune(source: &str) -> (String, Vec<String>) {
        let mut editor = SourceEditor::new(source.to_string()).unwrap();
        let removed = editor.prune_unused_imports(&[INSTRUMENT.to_string()]).unwrap();
        (editor.into_source(), removed)
    }

    #[test]
    fn test_prunes_unused_import_from_group() {
        let source = "package p\n\nimport (\n\t\"net/http\"\n\n\t\"github.com/datadog/orchestrion/instrument\"\n)\n\nfunc f() { _ = http.Get }\n";
        let (out, removed) = prune(source);
        assert_eq!(removed, vec![INSTRUMENT.to_string()]);
        assert_eq!(out, "package p\n\nimport (\n\t\"net/http\"\n)\n\nfunc f() { _ = http.Get }\n");
    }

    #[test]
    fn test_prunes_single_import_declaration() {
        let source = "package p\n\nimport \"github.com/datadog/orchestrion/instrument\"\n\nfunc f() {}\n";
        let (out, removed) = prune(source);
        assert_eq!(removed.len(), 1);
        assert_eq!(out, "package p\n\nfunc f() {}\n");
    }

    #[test]
    fn test_keeps_referenced_import() {
        let source = "package p\n\nimport \"github.com/datadog/orchestrion/instrument\"\n\nfunc f() { instrument.Report() }\n";
        let (out, removed) = prune(source);
        assert!(removed.is_empty());
        assert_eq!(out, source);
    }

    #[test]
    fn test_keeps_blank_import() {
        let source = "package p\n\nimport _ \"github.com/datadog/orchestrion/instrument\"\n\nfunc f() {}\n";
        let (out, removed) = prune(source);
        assert!(removed.is_empty());
        assert_eq!(out, source);
    }

    #[test]
    fn test_apply_edits_back_to_front() {
        let mut editor = SourceEditor::new("package p\n\nvar a = 1\n".to_string()).unwrap();
        editor.edits.push(Edit::replace(8..9, "q"));
        editor.edits.push(Edit::replace(15..16, "b"));
        editor.apply_edits().unwrap();
        assert_eq!(editor.get_source(), "package q\n\nvar b = 1\n");
        assert!(editor.first_error().is_none());
    }
}
