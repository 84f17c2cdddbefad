//! Error types for parsing Go source into the full-fidelity tree.

/// Result type alias for syntax operations.
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Errors raised while turning Go source into a tree, or back.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    /// The tree-sitter grammar could not be loaded
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser gave up without producing a tree
    #[error("parser produced no tree")]
    NoTree,

    /// The source contains a syntax error
    #[error("syntax error at {line}:{column}: {message}")]
    Invalid {
        line: usize,
        column: usize,
        message: String,
    },

    /// A node lacked a child the grammar guarantees
    #[error("malformed {kind} node: {message}")]
    Malformed { kind: String, message: String },
}

impl SyntaxError {
    /// Create a syntax error at a 0-based tree-sitter position.
    pub fn invalid(point: tree_sitter::Point, message: impl Into<String>) -> Self {
        Self::Invalid {
            line: point.row + 1,
            column: point.column + 1,
            message: message.into(),
        }
    }

    /// Create a malformed-node error
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
