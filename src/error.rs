// error.rs - Error types for pattern rejection.
//
// A pattern that the target regex dialect itself would refuse never gets a
// parse tree; these variants describe why. Checker findings are not errors,
// they are data (see checkers::Diagnostic).

use std::fmt;

/// Error type for pattern validation and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Syntax the target dialect rejects, with the byte offset it was
    /// detected at.
    Syntax { position: usize, message: String },
    /// The requested flags bitmask is contradictory (ASCII with UNICODE).
    IncompatibleFlags,
    /// An escape sequence that cannot be resolved to a character code.
    Escape { position: usize, message: String },
}

impl PatternError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        PatternError::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn escape(position: usize, message: impl Into<String>) -> Self {
        PatternError::Escape {
            position,
            message: message.into(),
        }
    }

    /// Byte offset the error was detected at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            PatternError::Syntax { position, .. } => Some(*position),
            PatternError::Escape { position, .. } => Some(*position),
            PatternError::IncompatibleFlags => None,
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Syntax { position, message } => {
                write!(f, "syntax error at {}: {}", position, message)
            }
            PatternError::IncompatibleFlags => {
                write!(f, "ASCII and UNICODE flags are incompatible")
            }
            PatternError::Escape { position, message } => {
                write!(f, "bad escape at {}: {}", position, message)
            }
        }
    }
}

impl std::error::Error for PatternError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_syntax() {
        let err = PatternError::syntax(3, "unbalanced parenthesis");
        assert_eq!(err.to_string(), "syntax error at 3: unbalanced parenthesis");
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn display_incompatible_flags() {
        let err = PatternError::IncompatibleFlags;
        assert_eq!(err.to_string(), "ASCII and UNICODE flags are incompatible");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(PatternError::IncompatibleFlags);
        assert!(err.to_string().contains("incompatible"));
    }
}
