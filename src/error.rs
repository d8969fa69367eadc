//! The single error category this crate produces: a compile-time error.
//!
//! Evaluation (`Path::find`) never fails — incompatible node kinds, out of
//! range indices, and missing comparison operands all silently contribute
//! nothing to the result, per the grammar's evaluation semantics.

use std::fmt;

/// An error produced while compiling a path string into a [`crate::Path`].
///
/// Carries a short, stable message plus the offending lexeme's text and
/// byte offset in the original input, so callers can point a user at the
/// exact spot that failed to parse.
#[derive(thiserror::Error, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset} (near `{fragment}`)")]
pub struct Error {
    pub(crate) message: String,
    pub(crate) fragment: String,
    pub(crate) offset: usize,
}

impl Error {
    pub(crate) fn new(
        message: impl Into<String>,
        fragment: impl Into<String>,
        offset: usize,
    ) -> Self {
        Error {
            message: message.into(),
            fragment: fragment.into(),
            offset,
        }
    }

    /// The human-readable message, independent of the offending fragment.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The text of the lexeme or fragment that caused the error.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The byte offset into the original path string where the error was
    /// detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error@{}: {} (`{}`)",
            self.offset, self.message, self.fragment
        )
    }
}
