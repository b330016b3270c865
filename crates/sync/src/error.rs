//! Sync Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Errors raised by `upsite-index` while reading a
//! document end up as children of [`ErrorKind::Parse`], errors from a
//! [`Transport`](crate::Transport) as children of [`ErrorKind::Transport`],
//! so callers can tell a bad document from a bad connection.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing is published at the requested location.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Reading from the transport failed part-way.
    #[display("I/O error")]
    Io,
    /// Fetching the index of the named source failed.
    #[display("failed to fetch index of source '{_0}'")]
    Transport(#[error(not(source))] String),
    /// The index of the named source could not be read.
    #[display("failed to read index of source '{_0}'")]
    Parse(#[error(not(source))] String),
    /// The named source was never registered.
    #[display("unknown source: {_0}")]
    UnknownSource(#[error(not(source))] String),
    /// Loading or saving the local cache failed.
    #[display("local cache error: {}", _0.display())]
    Cache(#[error(not(source))] PathBuf),
    /// A blocking task panicked or was cancelled.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Transport(_))
    }
}
