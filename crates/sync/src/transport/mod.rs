//! Where index documents come from.
//!
//! The engine never talks to the network itself; it asks a [`Transport`] for
//! the bytes at a URL and for when they were last modified. HTTP lives
//! outside this workspace. [`LocalTransport`] serves mirrors on the local
//! filesystem, and `MockTransport` (behind the `mock` feature) serves tests.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalTransport;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockTransport;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use upsite_compress::Compression;
use upsite_model::Timestamp;
use upsite_registry::Source;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;

/// A fetched index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Raw bytes, compressed or not.
    pub body: Vec<u8>,
    /// When the document was last modified, if the transport knows.
    pub last_modified: Option<OffsetDateTime>,
}

impl Fetched {
    pub fn new(body: impl Into<Vec<u8>>, last_modified: Option<OffsetDateTime>) -> Self {
        Self {
            body: body.into(),
            last_modified,
        }
    }

    /// The logical timestamp a source advances to after this document has
    /// been read. Without a last-modified signal the fetch time stands in.
    pub fn timestamp(&self) -> Timestamp {
        self.last_modified.map(Timestamp::from_datetime).unwrap_or_else(Timestamp::now)
    }
}

/// Fetches documents by URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name of the transport, for logging only.
    fn name(&self) -> &str;

    /// Fetch the complete document at `url`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if nothing is
    /// published there.
    async fn fetch(&self, url: &str) -> Result<Fetched>;
}

/// URL of the index document a source publishes.
pub fn index_url(source: &Source) -> String {
    let filename = Compression::Gzip.index_filename("db");
    if source.url.ends_with('/') {
        format!("{}{filename}", source.url)
    } else {
        format!("{}/{filename}", source.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    #[rstest]
    #[case("https://sites.example.org/site1/", "https://sites.example.org/site1/db.xml.gz")]
    #[case("https://sites.example.org/site1", "https://sites.example.org/site1/db.xml.gz")]
    #[case("file:///srv/mirror", "file:///srv/mirror/db.xml.gz")]
    fn test_index_url(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(index_url(&Source::new("site1", url)), expected);
    }

    #[test]
    fn test_timestamp_from_last_modified() {
        let fetched = Fetched::new(b"<files/>".to_vec(), Some(datetime!(2024-01-31 23:59:59 UTC)));
        assert_eq!(fetched.timestamp(), Timestamp::new(20240131235959));
    }

    #[test]
    fn test_timestamp_without_last_modified_is_now() {
        let before = Timestamp::now();
        let fetched = Fetched::new(Vec::new(), None);
        assert!(fetched.timestamp() >= before);
    }
}
