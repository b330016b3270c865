//! Index Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Every kind here aborts the read of the whole document;
//! entries committed before the failure stay committed.

use derive_more::{Display, Error};

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not well-formed markup, or ends inside a `<file>`.
    #[display("malformed index document")]
    MalformedDocument,
    /// An element lacks an attribute it cannot be understood without.
    #[display("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// A numeric attribute holds something other than a number.
    #[display("<{element}> attribute '{attribute}' is not a number: {value}")]
    InvalidNumber {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    /// A known element appeared where it makes no sense, like a `<version>`
    /// outside of any `<file>`.
    #[display("<{_0}> is not allowed here")]
    UnexpectedElement(#[error(not(source))] &'static str),
    /// The remote source being read was never registered.
    #[display("unknown source: {_0}")]
    UnknownSource(#[error(not(source))] String),
    /// The compression layer could not be set up or applied.
    #[display("compression error")]
    Compression,
    /// Reading or writing the underlying stream failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let missing = ErrorKind::MissingAttribute {
            element: "file",
            attribute: "filename",
        };
        assert_eq!(missing.to_string(), "<file> is missing required attribute 'filename'");
        assert_eq!(ErrorKind::UnexpectedElement("version").to_string(), "<version> is not allowed here");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io.is_retryable());
        assert!(!ErrorKind::MalformedDocument.is_retryable());
    }
}
