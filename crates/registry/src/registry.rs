use crate::Sources;
use std::collections::BTreeMap;
use tracing::debug;
use upsite_model::{Draft, FileEntry, Origin, Status, merge};

/// The canonical view of every file any source has mentioned, plus the
/// sources themselves.
///
/// Entries are created on first mention and never removed; they only ever
/// change by having another observation merged into them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRegistry {
    entries: BTreeMap<String, FileEntry>,
    sources: Sources,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Sources) -> Self {
        Self {
            entries: BTreeMap::new(),
            sources,
        }
    }

    pub fn get(&self, filename: &str) -> Option<&FileEntry> {
        self.entries.get(filename)
    }

    /// Mutable access for the pass that reconciles entries with the files on
    /// disk.
    pub fn get_mut(&mut self, filename: &str) -> Option<&mut FileEntry> {
        self.entries.get_mut(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// All entries, sorted by filename.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut Sources {
        &mut self.sources
    }

    /// The source currently owning `filename`, if any entry exists for it.
    pub fn owner_of(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(|entry| entry.source.as_str())
    }

    /// Merge a finished draft into the registry.
    pub fn commit(&mut self, draft: Draft, origin: Origin) -> &FileEntry {
        let filename = draft.filename().to_string();
        let existing = self.entries.remove(&filename);
        let merged = merge(existing, draft, origin);
        debug!(
            filename = %filename,
            source = %merged.source,
            status = %merged.status,
            ?origin,
            "Committed entry"
        );
        self.entries.entry(filename).or_insert(merged)
    }

    pub fn filter_by_status(&self, status: Status) -> impl Iterator<Item = &FileEntry> {
        self.entries.values().filter(move |entry| entry.status == status)
    }

    /// Entries whose provenance is the named source.
    pub fn from_source<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileEntry> {
        self.entries.values().filter(move |entry| entry.source == name)
    }

    /// Entries the installer has been asked to act on.
    pub fn pending(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values().filter(|entry| entry.action.is_pending())
    }
}
