//! Verbatim text between the children of a node.

use std::ops::Range;

/// The source text around and between the children of a structured node.
///
/// For a node with `n` children there are `n + 1` gaps: the text before the
/// first child, between each pair of children, and after the last one.
/// Punctuation, operators, keywords and inner comments all live here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    gaps: Vec<String>,
}

impl Layout {
    /// Slice the gaps out of `source` given the node range and the ranges of
    /// its children, which must be ordered and lie inside `node`.
    pub fn from_ranges(source: &str, node: Range<usize>, children: &[Range<usize>]) -> Self {
        let mut gaps = Vec::with_capacity(children.len() + 1);
        let mut cursor = node.start;
        for child in children {
            gaps.push(source[cursor..child.start].to_string());
            cursor = child.end;
        }
        gaps.push(source[cursor..node.end].to_string());
        Self { gaps }
    }

    /// Gap `i`: 0 is before the first child, `children` is after the last.
    pub fn gap(&self, i: usize) -> &str {
        self.gaps.get(i).map(String::as_str).unwrap_or("")
    }

    /// Interleave the gaps with `children`, each child written by `emit`.
    pub fn weave<T>(&self, out: &mut String, children: &[&T], mut emit: impl FnMut(&T, &mut String)) {
        for (i, child) in children.iter().enumerate() {
            out.push_str(self.gap(i));
            emit(child, out);
        }
        out.push_str(self.gap(children.len()));
    }
}
