//! Splitting inter-statement text into decorations.
//!
//! Between two statements the Go grammar only allows whitespace, `;` and
//! comments, so a small scanner is enough to attribute each comment either
//! to the statement before it (same line) or to the one after it.

/// Text of a decoration entry without the whitespace in front of it.
pub fn comment_text(entry: &str) -> &str {
    entry.trim_start_matches(|c: char| c.is_whitespace() || c == ';')
}

/// The pieces of the text that follows a statement.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Trailing<'a> {
    /// An explicit `;` (with the spaces before it).
    pub terminator: &'a str,
    /// Comments that start on the statement's last line.
    pub comments: Vec<String>,
    /// Everything else, starting at the first line break.
    pub rest: &'a str,
}

/// The pieces of the text in front of a statement.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Leading<'a> {
    pub comments: Vec<String>,
    /// Whitespace after the last comment.
    pub space: &'a str,
}

/// Comment starting at the beginning of `text`, if any, returning its length.
fn comment_len(text: &str) -> Option<usize> {
    if text.starts_with("//") {
        Some(text.find('\n').unwrap_or(text.len()))
    } else if text.starts_with("/*") {
        Some(text[2..].find("*/").map(|i| i + 4).unwrap_or(text.len()))
    } else {
        None
    }
}

fn skip_inline_space(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    from + (rest.len() - rest.trim_start_matches([' ', '\t', '\r']).len())
}

pub(crate) fn split_trailing(gap: &str) -> Trailing<'_> {
    let mut pos = skip_inline_space(gap, 0);
    let terminator_end = if gap[pos..].starts_with(';') {
        pos += 1;
        pos
    } else {
        0
    };

    let mut comments = Vec::new();
    let mut entry_start = terminator_end;
    loop {
        pos = skip_inline_space(gap, entry_start);
        match comment_len(&gap[pos..]) {
            Some(len) => {
                comments.push(gap[entry_start..pos + len].to_string());
                entry_start = pos + len;
            }
            None => break,
        }
    }

    Trailing {
        terminator: &gap[..terminator_end],
        comments,
        rest: &gap[entry_start..],
    }
}

pub(crate) fn split_leading(text: &str) -> Leading<'_> {
    let mut comments = Vec::new();
    let mut entry_start = 0;
    let mut pos = 0;
    while pos < text.len() {
        if let Some(len) = comment_len(&text[pos..]) {
            comments.push(text[entry_start..pos + len].to_string());
            pos += len;
            entry_start = pos;
        } else {
            pos += text[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }
    Leading {
        comments,
        space: &text[entry_start..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_text_strips_layout() {
        assert_eq!(comment_text("\n\t//dd:startwrap"), "//dd:startwrap");
        assert_eq!(comment_text(" /* x */"), "/* x */");
    }

    #[test]
    fn test_split_trailing_same_line_comments() {
        let gap = " // one /* two */\n\t// three\n\t";
        let trailing = split_trailing(gap);
        assert_eq!(trailing.terminator, "");
        assert_eq!(trailing.comments, vec![" // one /* two */".to_string()]);
        assert_eq!(trailing.rest, "\n\t// three\n\t");
    }

    #[test]
    fn test_split_trailing_block_comments() {
        let trailing = split_trailing(" /* a */ /* b */\n");
        assert_eq!(trailing.comments, vec![" /* a */", " /* b */"]);
        assert_eq!(trailing.rest, "\n");
    }

    #[test]
    fn test_split_trailing_terminator() {
        let trailing = split_trailing("; ");
        assert_eq!(trailing.terminator, ";");
        assert!(trailing.comments.is_empty());
        assert_eq!(trailing.rest, " ");
    }

    #[test]
    fn test_split_leading() {
        let leading = split_leading("\n\n\t// a\n\t/* b */\n\t");
        assert_eq!(leading.comments, vec!["\n\n\t// a", "\n\t/* b */"]);
        assert_eq!(leading.space, "\n\t");
    }

    #[test]
    fn test_split_leading_without_comments() {
        let leading = split_leading("\n\t");
        assert!(leading.comments.is_empty());
        assert_eq!(leading.space, "\n\t");
    }

    #[test]
    fn test_pieces_reassemble() {
        let gap = " // t\n\n\t// l\n\t";
        let trailing = split_trailing(gap);
        let leading = split_leading(trailing.rest);
        let rebuilt = format!(
            "{}{}{}{}",
            trailing.terminator,
            trailing.comments.concat(),
            leading.comments.concat(),
            leading.space
        );
        assert_eq!(rebuilt, gap);
    }
}
