use crate::{Classification, FileEntry, PlatformPolicy, Timestamp, classify};
use std::ops::{Deref, DerefMut};

/// Where a draft entry was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// An index published by an update site.
    Remote,
    /// The client's own snapshot of the registry.
    LocalCache,
}

impl Origin {
    /// Only a remote index may claim a file for its source.
    pub fn asserts_provenance(&self) -> bool {
        matches!(self, Origin::Remote)
    }
}

/// An entry under construction while its `<file>` element is being read,
/// plus the classification it was given once the element closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    entry: FileEntry,
    classification: Option<Classification>,
}

impl Draft {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            entry: FileEntry::new(filename, source),
            classification: None,
        }
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    pub fn classify<P>(&mut self, last_synced: Timestamp, policy: &P)
    where
        P: PlatformPolicy + ?Sized,
    {
        self.classification = classify(&self.entry, last_synced, policy);
    }

    pub(crate) fn into_parts(self) -> (FileEntry, Option<Classification>) {
        (self.entry, self.classification)
    }

    /// The finished entry, with its classification applied.
    pub fn into_entry(self) -> FileEntry {
        let (mut entry, classification) = self.into_parts();
        if let Some(classification) = classification {
            entry.status = classification.status;
            entry.action = classification.action;
        }
        entry
    }
}

impl From<FileEntry> for Draft {
    fn from(entry: FileEntry) -> Self {
        Self {
            entry,
            classification: None,
        }
    }
}

impl Deref for Draft {
    type Target = FileEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl DerefMut for Draft {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entry
    }
}
