use crate::{Action, Checksum, Dependency, Status, Timestamp, VersionRecord};
use std::collections::BTreeSet;

/// Everything the registry knows about one distributable file.
///
/// The version history is kept sorted oldest-first, and the current version
/// is never older than anything in the history: a record that would break
/// that (a stale "current" assertion, or a "previous" build newer than the
/// current one) is settled so that the newest known build is current. Both
/// hold after every mutation, not just after a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    filename: String,
    current: Option<VersionRecord>,
    previous: Vec<VersionRecord>,
    /// Size in bytes of the current version.
    pub file_size: u64,
    pub description: Option<String>,
    authors: Vec<String>,
    pub platforms: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub links: BTreeSet<String>,
    dependencies: Vec<Dependency>,
    pub executable: bool,
    /// Name of the source that last asserted ownership of this file.
    pub source: String,
    pub status: Status,
    pub action: Action,
}

impl FileEntry {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            current: None,
            previous: Vec::new(),
            file_size: 0,
            description: None,
            authors: Vec::new(),
            platforms: BTreeSet::new(),
            categories: BTreeSet::new(),
            links: BTreeSet::new(),
            dependencies: Vec::new(),
            executable: false,
            source: source.into(),
            status: Status::default(),
            action: Action::default(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The version the owning source currently publishes, if it still
    /// publishes one at all.
    pub fn current(&self) -> Option<&VersionRecord> {
        self.current.as_ref()
    }

    /// Earlier builds, oldest first.
    pub fn previous_versions(&self) -> &[VersionRecord] {
        &self.previous
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// A file without a current version has been withdrawn by its source.
    pub fn is_obsolete(&self) -> bool {
        self.current.is_none()
    }

    /// Timestamp of the newest build known for this file.
    pub fn newest_timestamp(&self) -> Option<Timestamp> {
        self.current.as_ref().or(self.previous.last()).map(|record| record.timestamp)
    }

    /// Returns `true` if a build with this checksum was ever published.
    pub fn has_version(&self, checksum: &Checksum) -> bool {
        self.version_for(checksum).is_some()
    }

    /// Find the published build matching a checksum, current first.
    pub fn version_for(&self, checksum: &Checksum) -> Option<&VersionRecord> {
        self.current
            .iter()
            .chain(self.previous.iter().rev())
            .find(|record| &record.checksum == checksum)
    }

    /// Declare `record` as the current version.
    ///
    /// Returns `true` if the record ended up current. An assertion older than
    /// the current version is kept, but only as history.
    pub fn set_version(&mut self, record: VersionRecord) -> bool {
        if let Some(current) = self.current.take()
            && current != record
        {
            self.insert_history(current);
        }
        self.current = Some(record.clone());
        self.settle();
        self.current.as_ref() == Some(&record)
    }

    pub fn add_previous_version(&mut self, record: VersionRecord) {
        self.insert_history(record);
        self.settle();
    }

    /// The source no longer publishes this file. The current version moves
    /// into the history; nothing is forgotten.
    pub fn withdraw(&mut self) {
        if let Some(current) = self.current.take() {
            self.insert_history(current);
        }
        self.file_size = 0;
    }

    /// Add a dependency edge, folding it into an existing edge to the same
    /// file if there is one.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        match self.dependencies.iter_mut().find(|existing| existing.filename == dependency.filename) {
            Some(existing) => existing.absorb(dependency),
            None => self.dependencies.push(dependency),
        }
    }

    pub fn add_author(&mut self, author: impl Into<String>) {
        let author = author.into();
        if !self.authors.contains(&author) {
            self.authors.push(author);
        }
    }

    pub fn add_platform(&mut self, platform: impl Into<String>) {
        self.platforms.insert(platform.into());
    }

    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.insert(category.into());
    }

    pub fn add_link(&mut self, link: impl Into<String>) {
        self.links.insert(link.into());
    }

    /// Set the status, resetting the action to the one that leaves the file
    /// untouched.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.action = status.no_action();
    }

    fn insert_history(&mut self, record: VersionRecord) {
        if let Err(position) = self.previous.binary_search(&record) {
            self.previous.insert(position, record);
        }
    }

    /// Restore the ordering between current and history.
    fn settle(&mut self) {
        let Some(mut current) = self.current.take() else {
            return;
        };
        self.previous.retain(|record| *record != current);
        // History is sorted, so only its last record can outrank the current one.
        if let Some(newest) = self.previous.pop_if(|record| record.timestamp > current.timestamp) {
            let displaced = std::mem::replace(&mut current, newest);
            self.insert_history(displaced);
        }
        self.current = Some(current);
    }
}
