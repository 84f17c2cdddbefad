//! Removal of `//dd:startwrap` .. `//dd:endwrap` regions.

use std::ops::Range;

use tracing::debug;
use unweave_syntax::{Block, Stmt, comment_text};

use crate::markers::{self, MarkerKind};

/// Delete every marked region of `block`, returning how many were removed.
///
/// `on_region` gets the statements of each region once they are cut out.
///
/// A region either sits on one statement (start marker leading, end marker
/// trailing) or runs from the statement carrying the start marker up to the
/// next end marker: a leading end marker leaves its statement in place, a
/// trailing one takes it along. After every deletion the scan restarts from
/// the top, since later markers may now pair up differently. A start marker
/// without a matching end is stripped and its statements are kept.
pub fn remove_regions<F>(block: &mut Block, mut on_region: F) -> usize
where
    F: FnMut(&mut Vec<Stmt>),
{
    let mut removed = 0;
    let mut i = 0;
    while i < block.stmts.len() {
        if !markers::has_leading(&block.stmts[i], MarkerKind::RegionStart) {
            i += 1;
            continue;
        }

        let carried = markers::detach_before(&mut block.stmts[i], MarkerKind::RegionStart);
        markers::strip_leading(&mut block.stmts[i], MarkerKind::RegionStart);

        match close_region(&mut block.stmts, i) {
            Some(range) => {
                debug!(
                    line = block.stmts[i].line,
                    statements = range.len(),
                    "removing region"
                );
                let mut region = excise(block, range, carried);
                on_region(&mut region);
                removed += 1;
                i = 0;
            }
            None => {
                debug!(line = block.stmts[i].line, "region start without end, keeping statements");
                restore(&mut block.stmts[i], carried);
                i += 1;
            }
        }
    }
    removed
}

/// Find and strip the end marker of the region opening at `start`,
/// returning the statements it covers.
fn close_region(stmts: &mut [Stmt], start: usize) -> Option<Range<usize>> {
    if markers::strip_trailing(&mut stmts[start], MarkerKind::RegionEnd) > 0 {
        return Some(start..start + 1);
    }
    for j in start + 1..stmts.len() {
        if markers::strip_leading(&mut stmts[j], MarkerKind::RegionEnd) > 0 {
            return Some(start..j);
        }
        if markers::strip_trailing(&mut stmts[j], MarkerKind::RegionEnd) > 0 {
            return Some(start..j + 1);
        }
    }
    None
}

/// Cut `range` out of `block` and return it.
///
/// `carried` comments go to whatever follows the range, together with the
/// own-line comments that trailed its last statement.
pub(crate) fn excise(block: &mut Block, range: Range<usize>, carried: Vec<String>) -> Vec<Stmt> {
    let at = range.start;
    let removed: Vec<Stmt> = block.stmts.drain(range).collect();

    let mut moved = carried;
    if let Some(last) = removed.last() {
        moved.extend(
            last.decs
                .end
                .iter()
                .filter(|d| is_own_line(d) && MarkerKind::classify(d).is_none())
                .cloned(),
        );
    }
    if !moved.is_empty() {
        match block.stmts.get_mut(at) {
            Some(next) => restore(next, moved),
            None => block.close.insert_str(0, &moved.concat()),
        }
    }
    removed
}

fn is_own_line(entry: &str) -> bool {
    entry[..entry.len() - comment_text(entry).len()].contains('\n')
}

fn restore(stmt: &mut Stmt, carried: Vec<String>) {
    stmt.decs.start.splice(0..0, carried);
}
