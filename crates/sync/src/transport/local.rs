//! Local filesystem transport.

use crate::error::{ErrorKind, Result};
use crate::transport::{Fetched, Transport};
use async_trait::async_trait;
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tracing::instrument;

/// Serves `file://` URLs and plain paths from the local filesystem, using
/// the file's modification time as its last-modified signal.
///
/// Useful for mirrors on a shared drive, and for sources maintained on the
/// same machine.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    name: String,
}

impl LocalTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn path_of(url: &str) -> PathBuf {
        Path::new(url.strip_prefix("file://").unwrap_or(url)).to_path_buf()
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new("local")
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(bytes))]
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let path = Self::path_of(url);
        let body = match fs::read(&path).await {
            Ok(body) => body,
            Err(err) if err.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(url.to_string())),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io),
        };
        let last_modified = fs::metadata(&path)
            .await
            .and_then(|metadata| metadata.modified())
            .ok()
            .map(OffsetDateTime::from);
        tracing::Span::current().record("bytes", body.len());
        Ok(Fetched::new(body, last_modified))
    }
}
