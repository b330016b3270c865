//! Update-site index documents.
//!
//! An index is an XML document, usually gzip-compressed, listing every file
//! a source publishes along with its version history and metadata:
//!
//! ```xml
//! <files>
//!   <file filename="jars/foo.jar" executable="true">
//!     <version checksum="abc" timestamp="20240131235959" filesize="1234"/>
//!     <previous-version checksum="old" timestamp="20230101000000"/>
//!     <dependency filename="jars/bar.jar" timestamp="20231201000000" overrides="true"/>
//!     <description>Does things</description>
//!     <author>Someone</author>
//!   </file>
//! </files>
//! ```
//!
//! The client's own cache uses the same format, plus `<source-descriptor>`
//! elements for the sources it knows and an `update-site` attribute on each
//! `<file>`. The older element names `plugin` and `update-site` are accepted
//! in place of `file` and `source-descriptor`.
//!
//! [`read_remote`] and [`read_local_cache`] merge a document into a
//! [`FileRegistry`](upsite_registry::FileRegistry); [`write_local_cache`]
//! produces the cache document from one.

mod element;
pub mod error;
mod reader;
mod writer;

pub use crate::reader::{ReadReport, Warning, read_local_cache, read_remote};
pub use crate::writer::write_local_cache;
