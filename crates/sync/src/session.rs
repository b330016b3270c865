//! A sync session: fetch the indexes of several sources and fold them into
//! one registry.
//!
//! Fetching is pure I/O and runs concurrently; reading a fetched document
//! into the registry happens under the registry lock, one source at a time,
//! in the order the sources were requested. Two sources publishing the same
//! file are therefore always merged in the same order, however the fetches
//! happen to race.

use crate::error::{ErrorKind, Result};
use crate::transport::{Fetched, TransportHandle, index_url};
use async_stream::stream;
use exn::{OptionExt, ResultExt};
use futures::{Stream, StreamExt, TryStreamExt};
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use upsite_compress::Compression;
use upsite_index::{ReadReport, Warning, read_local_cache, read_remote, write_local_cache};
use upsite_model::{HostPlatform, PlatformPolicy, Timestamp};
use upsite_registry::FileRegistry;

/// Number of index fetches allowed in flight at once, unless configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

pub type RegistryHandle = Arc<Mutex<FileRegistry>>;
type PolicyHandle = Arc<dyn PlatformPolicy + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    /// A source's index arrived and is about to be read.
    Fetched { source: String, bytes: usize },
    Committed(SourceReport),
    Complete,
}

/// What reading one source's index did to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    /// The source's last-synced marker after the read.
    pub last_synced: Timestamp,
    pub read: ReadReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub sources: Vec<SourceReport>,
}

impl SyncReport {
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.sources.iter().flat_map(|source| source.read.warnings.iter())
    }

    pub fn committed(&self) -> usize {
        self.sources.iter().map(|source| source.read.committed).sum()
    }
}

pub struct Session {
    registry: RegistryHandle,
    transport: TransportHandle,
    policy: PolicyHandle,
    concurrency: usize,
}

impl Session {
    /// A session over `registry`, classifying against the platform this
    /// binary was built for.
    pub fn new(registry: FileRegistry, transport: TransportHandle) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            transport,
            policy: Arc::new(HostPlatform::detect()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_policy(mut self, policy: impl PlatformPolicy + Send + Sync + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The shared registry, for the passes that run after a sync (comparing
    /// entries against the files on disk, installing, uploading).
    pub fn registry(&self) -> RegistryHandle {
        Arc::clone(&self.registry)
    }

    /// Sync the named sources, reporting progress as it happens.
    ///
    /// Every name is resolved before anything is fetched, so an unknown
    /// source fails the whole sync up front. After that the stream ends at
    /// the first failure; sources committed before it stay committed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use futures::TryStreamExt;
    /// use std::pin::pin;
    /// use upsite_sync::{Session, SyncEvent};
    /// # async fn example(session: &Session) -> upsite_sync::error::Result<()> {
    /// let mut events = pin!(session.sync(["site1", "site2"]));
    /// while let Some(event) = events.try_next().await? {
    ///     if let SyncEvent::Committed(report) = event {
    ///         println!("{}: {} files", report.source, report.read.committed);
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn sync<I, S>(&self, names: I) -> impl Stream<Item = Result<SyncEvent>> + '_
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sync_names(names.into_iter().map(Into::into).collect())
    }

    fn sync_names(&self, names: Vec<String>) -> impl Stream<Item = Result<SyncEvent>> + '_ {
        stream! {
            yield Ok(SyncEvent::Started);
            let targets = match self.resolve(names).await {
                Ok(targets) => targets,
                Err(err) => {
                    yield Err(err);
                    return;
                },
            };

            let transport = &self.transport;
            let mut fetches = pin!(
                futures::stream::iter(targets)
                    .map(|(name, url)| async move {
                        let fetched = transport.fetch(&url).await.or_raise(|| ErrorKind::Transport(name.clone()));
                        (name, fetched)
                    })
                    .buffered(self.concurrency)
            );
            while let Some((name, fetched)) = fetches.next().await {
                let fetched = match fetched {
                    Ok(fetched) => fetched,
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                };
                yield Ok(SyncEvent::Fetched { source: name.clone(), bytes: fetched.body.len() });
                match self.commit(&name, fetched).await {
                    Ok(report) => yield Ok(SyncEvent::Committed(report)),
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                }
            }
            yield Ok(SyncEvent::Complete);
        }
    }

    /// Sync the named sources and collect the per-source reports.
    pub async fn sync_all<I, S>(&self, names: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut report = SyncReport::default();
        let mut events = pin!(self.sync(names));
        while let Some(event) = events.try_next().await? {
            if let SyncEvent::Committed(source) = event {
                report.sources.push(source);
            }
        }
        Ok(report)
    }

    /// Merge the local cache at `path` into the registry. A cache that
    /// doesn't exist yet reads as empty.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load_local_cache(&self, path: impl AsRef<Path>) -> Result<ReadReport> {
        let path = path.as_ref();
        let body = match fs::read(path).await {
            Ok(body) => body,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                debug!("No local cache yet");
                return Ok(ReadReport::default());
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Cache(path.to_path_buf())),
        };
        let mut registry = self.registry.lock().await;
        let report = read_local_cache(&mut registry, body.as_slice(), self.policy.as_ref())
            .or_raise(|| ErrorKind::Cache(path.to_path_buf()))?;
        info!(committed = report.committed, dropped = report.dropped, "Loaded local cache");
        Ok(report)
    }

    /// Write the whole registry to `path`, replacing any previous cache only
    /// once the new one is completely written.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn save_local_cache(&self, path: impl AsRef<Path>, compression: Compression) -> Result<()> {
        let path = path.as_ref();
        let snapshot = self.registry.lock().await.clone();
        let body = tokio::task::spawn_blocking(move || {
            let mut body = Vec::new();
            write_local_cache(&snapshot, &mut body, compression).map(|()| body)
        })
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(|| ErrorKind::Cache(path.to_path_buf()))?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Cache(path.to_path_buf()))?;
        }
        let staging = path.with_extension("partial");
        fs::write(&staging, &body).await.or_raise(|| ErrorKind::Cache(path.to_path_buf()))?;
        fs::rename(&staging, path).await.or_raise(|| ErrorKind::Cache(path.to_path_buf()))?;
        debug!(bytes = body.len(), "Saved local cache");
        Ok(())
    }

    async fn resolve(&self, names: Vec<String>) -> Result<Vec<(String, String)>> {
        let registry = self.registry.lock().await;
        names
            .into_iter()
            .map(|name| -> Result<(String, String)> {
                let url = registry
                    .sources()
                    .get(&name)
                    .map(index_url)
                    .ok_or_raise(|| ErrorKind::UnknownSource(name.clone()))?;
                Ok((name, url))
            })
            .collect()
    }

    #[instrument(skip(self, fetched), fields(bytes = fetched.body.len()))]
    async fn commit(&self, name: &str, fetched: Fetched) -> Result<SourceReport> {
        let timestamp = fetched.timestamp();
        let mut registry = Arc::clone(&self.registry).lock_owned().await;
        let policy = Arc::clone(&self.policy);
        let source = name.to_string();
        // The guard moves into the blocking task and comes back with the report.
        let (mut registry, read) = tokio::task::spawn_blocking(move || {
            let read = read_remote(&mut registry, &source, fetched.body.as_slice(), policy.as_ref());
            (registry, read)
        })
        .await
        .or_raise(|| ErrorKind::Task)?;
        let read = read.or_raise(|| ErrorKind::Parse(name.to_string()))?;
        let last_synced = registry
            .sources_mut()
            .advance(name, timestamp)
            .or_raise(|| ErrorKind::UnknownSource(name.to_string()))?;
        info!(
            source = name,
            committed = read.committed,
            warnings = read.warnings.len(),
            %last_synced,
            "Synced source"
        );
        Ok(SourceReport {
            source: name.to_string(),
            last_synced,
            read,
        })
    }
}
