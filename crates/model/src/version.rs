use crate::{Checksum, Timestamp};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One specific build of a file: what it hashes to, and when it was
/// published.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRecord {
    pub checksum: Checksum,
    pub timestamp: Timestamp,
}
impl VersionRecord {
    pub fn new(checksum: impl Into<Checksum>, timestamp: Timestamp) -> Self {
        Self {
            checksum: checksum.into(),
            timestamp,
        }
    }

    pub fn is_newer_than(&self, timestamp: Timestamp) -> bool {
        self.timestamp > timestamp
    }
}

impl Ord for VersionRecord {
    /// Oldest first; builds published in the same second are ordered by
    /// checksum so that sorting is total and deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp).then_with(|| self.checksum.cmp(&other.checksum))
    }
}
impl PartialOrd for VersionRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for VersionRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}@{}", self.checksum, self.timestamp)
    }
}
