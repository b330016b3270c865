//! The registry of update sites and the files they publish.
//!
//! [`Sources`] tracks every known update site and how far this client has
//! read each one. [`FileRegistry`] is the single mutable view that index
//! reads are committed into.

pub mod error;
mod registry;
mod source;
mod sources;

pub use crate::registry::FileRegistry;
pub use crate::source::Source;
pub use crate::sources::Sources;
