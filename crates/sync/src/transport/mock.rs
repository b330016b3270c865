//! In-memory transport for testing.

use crate::error::{ErrorKind, Result};
use crate::transport::{Fetched, Transport};
use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory transport for testing.
///
/// Documents are stored in a `HashMap` behind a [`RwLock`], so they can be
/// republished between syncs through a shared reference. Every requested
/// URL is recorded, in order.
#[derive(Debug, Default)]
pub struct MockTransport {
    documents: RwLock<HashMap<String, Fetched>>,
    requests: RwLock<Vec<String>>,
}

impl MockTransport {
    /// Add a document before the transport is shared.
    pub fn with_document(
        mut self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
        last_modified: Option<OffsetDateTime>,
    ) -> Self {
        self.documents.get_mut().insert(url.into(), Fetched::new(body, last_modified));
        self
    }

    /// Publish (or replace) a document.
    pub async fn publish(&self, url: impl Into<String>, body: impl Into<Vec<u8>>, last_modified: Option<OffsetDateTime>) {
        self.documents.write().await.insert(url.into(), Fetched::new(body, last_modified));
    }

    /// Every URL fetched so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str) -> Result<Fetched> {
        self.requests.write().await.push(url.to_string());
        match self.documents.read().await.get(url) {
            Some(fetched) => Ok(fetched.clone()),
            None => exn::bail!(ErrorKind::NotFound(url.to_string())),
        }
    }
}
