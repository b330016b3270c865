use crate::Source;
use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::collections::BTreeMap;
use tracing::debug;
use upsite_model::{DEFAULT_SOURCE, Timestamp};

/// Every source the client knows about, keyed by name.
///
/// The default source is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    sources: BTreeMap<String, Source>,
}

impl Sources {
    pub fn new() -> Self {
        let local = Source::local();
        Self {
            sources: BTreeMap::from([(local.name().to_string(), local)]),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Source> {
        self.sources.get_mut(name)
    }

    /// Like [`get`](Self::get), for callers that cannot continue without it.
    pub fn require(&self, name: &str) -> Result<&Source> {
        self.sources
            .get(name)
            .ok_or_raise(|| ErrorKind::UnknownSource(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Register a source, or update the one already registered under the
    /// same name.
    ///
    /// Updating replaces the location fields but keeps the later of the two
    /// last-synced markers, so re-reading an old descriptor never rewinds a
    /// source.
    pub fn add(&mut self, source: Source) {
        match self.sources.get_mut(source.name()) {
            Some(existing) => {
                existing.advance(source.last_synced());
                existing.url = source.url;
                existing.upload_target = source.upload_target;
                existing.ssh_host = source.ssh_host;
            },
            None => {
                debug!(name = source.name(), url = %source.url, "Registered source");
                self.sources.insert(source.name().to_string(), source);
            },
        }
    }

    /// Forget a source. Entries it published stay in the registry.
    pub fn remove(&mut self, name: &str) -> Result<Option<Source>> {
        if name == DEFAULT_SOURCE {
            exn::bail!(ErrorKind::ReservedSource(name.to_string()));
        }
        Ok(self.sources.remove(name))
    }

    /// Advance a source's last-synced marker, returning the resulting value.
    pub fn advance(&mut self, name: &str, timestamp: Timestamp) -> Result<Timestamp> {
        let source = self
            .sources
            .get_mut(name)
            .ok_or_raise(|| ErrorKind::UnknownSource(name.to_string()))?;
        if source.advance(timestamp) {
            debug!(name, %timestamp, "Advanced source");
        }
        Ok(source.last_synced())
    }

    pub fn default_source(&self) -> Option<&Source> {
        self.sources.get(DEFAULT_SOURCE)
    }

    /// All sources, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    /// All sources except the default one.
    pub fn remote(&self) -> impl Iterator<Item = &Source> {
        self.sources.values().filter(|source| !source.is_default())
    }

    /// Number of sources, the default one included. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Source> for Sources {
    fn extend<T: IntoIterator<Item = Source>>(&mut self, iter: T) {
        iter.into_iter().for_each(|source| self.add(source));
    }
}
