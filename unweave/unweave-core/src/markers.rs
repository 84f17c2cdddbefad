//! Marker comments left by the instrumentation pass.
//!
//! A marker is a statement decoration whose comment text starts with one of
//! a fixed set of prefixes. Anything after the prefix is ignored.

use std::fmt;

use unweave_syntax::{Block, Stmt, VisitMut, comment_text, walk_block_mut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    /// Opens a region of inserted statements.
    RegionStart,
    /// Closes a region.
    RegionEnd,
    /// Opens a span of inserted statements.
    SpanStart,
    /// Closes a span.
    SpanEnd,
    /// Tags a statement that was instrumented in place.
    Instrumented,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 5] = [
        MarkerKind::RegionStart,
        MarkerKind::RegionEnd,
        MarkerKind::SpanStart,
        MarkerKind::SpanEnd,
        MarkerKind::Instrumented,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            MarkerKind::RegionStart => "//dd:startwrap",
            MarkerKind::RegionEnd => "//dd:endwrap",
            MarkerKind::SpanStart => "//dd:startinstrument",
            MarkerKind::SpanEnd => "//dd:endinstrument",
            MarkerKind::Instrumented => "//dd:instrumented",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::RegionStart => "region-start",
            MarkerKind::RegionEnd => "region-end",
            MarkerKind::SpanStart => "span-start",
            MarkerKind::SpanEnd => "span-end",
            MarkerKind::Instrumented => "already-instrumented",
        }
    }

    /// Classify a decoration entry.
    pub fn classify(entry: &str) -> Option<MarkerKind> {
        let text = comment_text(entry);
        Self::ALL
            .into_iter()
            .find(|kind| text.starts_with(kind.prefix()))
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn has_leading(stmt: &Stmt, kind: MarkerKind) -> bool {
    stmt.decs.start_has(kind.prefix())
}

pub fn has_trailing(stmt: &Stmt, kind: MarkerKind) -> bool {
    stmt.decs.end_has(kind.prefix())
}

pub fn strip_leading(stmt: &mut Stmt, kind: MarkerKind) -> usize {
    stmt.strip_start(kind.prefix())
}

pub fn strip_trailing(stmt: &mut Stmt, kind: MarkerKind) -> usize {
    stmt.decs.strip_end(kind.prefix())
}

/// Remove `kind` from both decoration lists of `stmt`.
pub fn strip(stmt: &mut Stmt, kind: MarkerKind) -> usize {
    stmt.strip_decoration(kind.prefix())
}

/// Detach the leading comments in front of the first `kind` marker.
///
/// Returns nothing when the statement has no such marker.
pub fn detach_before(stmt: &mut Stmt, kind: MarkerKind) -> Vec<String> {
    let Some(pos) = stmt
        .decs
        .start
        .iter()
        .position(|d| MarkerKind::classify(d) == Some(kind))
    else {
        return Vec::new();
    };
    stmt.decs.start.drain(..pos).collect()
}

/// Count the markers still present in `block`, closures included.
///
/// Comments around the braces of a block are counted too.
pub fn count_markers(block: &mut Block) -> usize {
    let mut counter = MarkerCounter::default();
    counter.visit_block_mut(block);
    counter.count
}

#[derive(Default)]
struct MarkerCounter {
    count: usize,
}

impl VisitMut for MarkerCounter {
    fn visit_block_mut(&mut self, block: &mut Block) {
        self.count += block
            .stmts
            .iter()
            .flat_map(|s| s.decs.start.iter().chain(&s.decs.end))
            .filter(|d| MarkerKind::classify(d).is_some())
            .count();
        self.count += block
            .open
            .trim_start_matches('{')
            .lines()
            .chain(block.close.lines())
            .filter(|line| MarkerKind::classify(line).is_some())
            .count();
        walk_block_mut(self, block);
    }
}
