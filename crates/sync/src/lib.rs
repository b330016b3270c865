//! Syncing update-site indexes into a local registry.
//!
//! A [`Session`] owns the registry behind a lock and a [`Transport`] that
//! knows how to fetch documents. Syncing a list of sources fetches their
//! indexes concurrently, then reads each one into the registry in the order
//! the sources were named:
//!
//! ```no_run
//! use std::sync::Arc;
//! use upsite_registry::{FileRegistry, Source};
//! use upsite_sync::{LocalTransport, Session};
//!
//! # async fn example() -> upsite_sync::error::Result<()> {
//! let mut registry = FileRegistry::new();
//! registry.sources_mut().add(Source::new("mirror", "file:///srv/mirror/"));
//!
//! let session = Session::new(registry, Arc::new(LocalTransport::default()));
//! session.load_local_cache("db.xml.gz").await?;
//! let report = session.sync_all(["mirror"]).await?;
//! for warning in report.warnings() {
//!     eprintln!("{warning}");
//! }
//! session.save_local_cache("db.xml.gz", Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod session;
mod transport;

pub use crate::session::{DEFAULT_CONCURRENCY, RegistryHandle, Session, SourceReport, SyncEvent, SyncReport};
#[cfg(any(test, feature = "mock"))]
pub use crate::transport::MockTransport;
pub use crate::transport::{Fetched, LocalTransport, Transport, TransportHandle, index_url};
