//! Removal of `//dd:startinstrument` .. `//dd:endinstrument` spans and
//! stripping of `//dd:instrumented` tags.

use serde::Serialize;
use tracing::debug;
use unweave_syntax::Block;

use crate::markers::{self, MarkerKind};
use crate::region::excise;

/// What a span pass removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanStats {
    pub spans: usize,
    pub tags: usize,
}

/// Delete every span of `block`.
///
/// A span starts at the last statement with a leading start marker (the
/// first statement if there is none) and ends at the first end marker. A
/// leading end marker keeps its statement, a trailing one removes it with
/// the span. Statements tagged as instrumented in place lose the tag and
/// stay. A start and end marker on the same statement cover nothing and are
/// only stripped.
pub fn remove_spans(block: &mut Block) -> SpanStats {
    let mut stats = SpanStats::default();
    while let Some(removed) = remove_first_span(block, &mut stats) {
        if removed > 0 {
            stats.spans += 1;
        }
    }
    stats
}

/// One pass up to the first end marker. Returns how many statements went,
/// or `None` when no end marker is left.
fn remove_first_span(block: &mut Block, stats: &mut SpanStats) -> Option<usize> {
    let mut start = 0;
    for j in 0..block.stmts.len() {
        let stmt = &block.stmts[j];
        if markers::has_leading(stmt, MarkerKind::SpanStart) {
            start = j;
        }

        if markers::has_leading(stmt, MarkerKind::SpanEnd) {
            markers::strip_leading(&mut block.stmts[j], MarkerKind::SpanEnd);
            if start == j {
                debug!(line = block.stmts[j].line, "empty span, stripping markers");
                markers::strip_leading(&mut block.stmts[j], MarkerKind::SpanStart);
                return Some(0);
            }
            debug!(line = block.stmts[start].line, statements = j - start, "removing span");
            let carried = markers::detach_before(&mut block.stmts[start], MarkerKind::SpanStart);
            return Some(excise(block, start..j, carried).len());
        }

        if markers::has_trailing(stmt, MarkerKind::SpanEnd) {
            debug!(line = block.stmts[start].line, statements = j + 1 - start, "removing span");
            let carried = markers::detach_before(&mut block.stmts[start], MarkerKind::SpanStart);
            return Some(excise(block, start..j + 1, carried).len());
        }

        if markers::has_leading(stmt, MarkerKind::Instrumented) {
            stats.tags += markers::strip(&mut block.stmts[j], MarkerKind::Instrumented);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use unweave_syntax::{Emit, GoParser};

    fn run(stmts: &str) -> (String, SpanStats) {
        let source = format!("package p\n\nfunc f() {{\n{stmts}}}\n");
        let file = GoParser::new().unwrap().parse_file(&source).unwrap();
        let mut block = file.funcs().next().unwrap().body.clone().unwrap();
        let stats = remove_spans(&mut block);
        (block.to_source(), stats)
    }

    #[test]
    fn test_leading_end_keeps_end_statement() {
        let (out, stats) = run(
            "\ta()\n\t//dd:startinstrument\n\tspan := start()\n\tdefer span.Finish()\n\t//dd:endinstrument\n\tb()\n\tc()\n",
        );
        assert_eq!(out, "{\n\ta()\n\tb()\n\tc()\n}");
        assert_eq!(stats, SpanStats { spans: 1, tags: 0 });
    }

    #[test]
    fn test_trailing_end_removes_end_statement() {
        let (out, stats) = run(
            "\ta()\n\t//dd:startinstrument\n\tspan := start()\n\tdefer span.Finish() //dd:endinstrument\n\tb()\n",
        );
        assert_eq!(out, "{\n\ta()\n\tb()\n}");
        assert_eq!(stats.spans, 1);
    }

    #[test]
    fn test_multiple_spans() {
        let (out, stats) = run(
            "\t//dd:startinstrument\n\tx()\n\t//dd:endinstrument\n\ta()\n\t//dd:startinstrument\n\ty() //dd:endinstrument\n\tb()\n",
        );
        assert_eq!(out, "{\n\ta()\n\tb()\n}");
        assert_eq!(stats.spans, 2);
    }

    #[test]
    fn test_end_without_start_counts_from_top() {
        let (out, stats) = run("\tx()\n\ty()\n\t//dd:endinstrument\n\tz()\n");
        assert_eq!(out, "{\n\tz()\n}");
        assert_eq!(stats.spans, 1);
    }

    #[test]
    fn test_instrumented_tag_is_stripped() {
        let (out, stats) = run("\ta()\n\t// keep\n\t//dd:instrumented\n\tb() // trailing\n\tc()\n");
        assert_eq!(out, "{\n\ta()\n\t// keep\n\tb() // trailing\n\tc()\n}");
        assert_eq!(stats, SpanStats { spans: 0, tags: 1 });
    }

    #[test]
    fn test_unclosed_span_is_left_alone() {
        let source = "\ta()\n\t//dd:startinstrument\n\tb()\n";
        let (out, stats) = run(source);
        assert_eq!(out, format!("{{\n{source}}}"));
        assert_eq!(stats, SpanStats::default());
    }

    #[test]
    fn test_start_and_end_on_one_statement_remove_nothing() {
        let (out, stats) = run("\ta()\n\t//dd:startinstrument\n\t//dd:endinstrument\n\tb()\n");
        assert_eq!(out, "{\n\ta()\n\tb()\n}");
        assert_eq!(stats, SpanStats::default());
    }

    #[test]
    fn test_end_marker_after_last_statement() {
        let (out, stats) = run("\ta()\n\t//dd:startinstrument\n\tdefer span.Finish()\n\t//dd:endinstrument\n");
        assert_eq!(out, "{\n\ta()\n}");
        assert_eq!(stats.spans, 1);
    }
}
