use crate::{DEFAULT_SOURCE, Draft, FileEntry, Origin, Status};
use tracing::debug;

/// Fold a freshly read draft into whatever the registry already holds for
/// the same filename.
pub fn merge(existing: Option<FileEntry>, incoming: Draft, origin: Origin) -> FileEntry {
    match existing {
        None => incoming.into_entry(),
        Some(mut entry) => {
            entry.merge_from(incoming, origin);
            entry
        },
    }
}

impl FileEntry {
    /// Merge another observation of this file into it.
    ///
    /// History is only ever added to. Set-valued metadata is unioned, the
    /// description and the executable flag follow the newest observation,
    /// and dependency edges are folded per filename. An unclassified
    /// observation clears a `New` status left by an earlier read.
    pub fn merge_from(&mut self, incoming: Draft, origin: Origin) {
        let (upstream, classification) = incoming.into_parts();
        debug_assert_eq!(self.filename(), upstream.filename());

        if origin.asserts_provenance() && upstream.source != DEFAULT_SOURCE && upstream.source != self.source {
            debug!(filename = self.filename(), from = %self.source, to = %upstream.source, "File changed source");
            self.source = upstream.source.clone();
        }

        for record in upstream.previous_versions() {
            self.add_previous_version(record.clone());
        }
        match upstream.current() {
            Some(record) => {
                if self.set_version(record.clone()) {
                    self.file_size = upstream.file_size;
                }
            },
            None => self.withdraw(),
        }

        if upstream.description.is_some() {
            self.description = upstream.description.clone();
        }
        for author in upstream.authors() {
            self.add_author(author.as_str());
        }
        self.platforms.extend(upstream.platforms.iter().cloned());
        self.categories.extend(upstream.categories.iter().cloned());
        self.links.extend(upstream.links.iter().cloned());
        for dependency in upstream.dependencies() {
            self.add_dependency(dependency.clone());
        }
        self.executable = upstream.executable;

        match classification {
            Some(classification) => {
                self.status = classification.status;
                self.action = classification.action;
            },
            // Nothing new this time; any status set outside of reading stays.
            None if self.status == Status::New => self.set_status(Status::NotInstalled),
            None => {},
        }
    }
}
