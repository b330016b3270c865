//! Data model for update-site metadata.
//!
//! A [`FileEntry`] aggregates everything the registry knows about one
//! distributable file: the version currently published, the history of
//! versions that came before it, its dependencies and descriptive metadata,
//! and which source asserted it. Index parsing produces [`Draft`]s, which are
//! classified ([`classify`]) and then folded into existing entries ([`merge`]).
//!
//! Nothing in here performs I/O except [`Checksum::of_reader`], which hashes
//! whatever reader it is handed.

mod checksum;
mod classify;
mod dependency;
mod draft;
mod entry;
pub mod error;
mod merge;
mod status;
mod timestamp;
mod version;

pub use crate::checksum::Checksum;
pub use crate::classify::{AnyPlatform, Classification, HostPlatform, PlatformPolicy, classify};
pub use crate::dependency::Dependency;
pub use crate::draft::{Draft, Origin};
pub use crate::entry::FileEntry;
pub use crate::merge::merge;
pub use crate::status::{Action, Status};
pub use crate::timestamp::Timestamp;
pub use crate::version::VersionRecord;

/// Name of the distinguished source representing the user's own cache.
pub const DEFAULT_SOURCE: &str = "default";
