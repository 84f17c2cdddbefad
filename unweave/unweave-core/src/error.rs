//! Error types for the uninstrumentation engine.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, UninstrumentError>;

/// Errors that stop a file from being uninstrumented.
///
/// Rules that do not match and unbalanced markers are not errors.
#[derive(Debug, thiserror::Error)]
pub enum UninstrumentError {
    /// The input is not valid Go
    #[error("error parsing content in {file}: {message}")]
    Parse { file: String, message: String },

    /// The rewritten tree printed to invalid Go
    #[error("error printing {file}: {message}")]
    Serialize { file: String, message: String },

    /// Reading the input or writing the output failed
    #[error("IO error on {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl UninstrumentError {
    /// Create a new parse error
    pub fn parse(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create a new serialize error
    pub fn serialize(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Serialize {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create a new IO error
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            file: file.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// File the error refers to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Parse { file, .. } | Self::Serialize { file, .. } | Self::Io { file, .. } => {
                Some(file)
            }
            Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = UninstrumentError::parse("main.go", "syntax error at 3:1: unexpected input");
        assert_eq!(
            err.to_string(),
            "error parsing content in main.go: syntax error at 3:1: unexpected input"
        );
        assert_eq!(err.file(), Some("main.go"));
        assert_eq!(UninstrumentError::config("bad").file(), None);
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error;

        let err = UninstrumentError::io(
            "a.go",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("a.go"));
    }
}
