use crate::{Action, FileEntry, Status, Timestamp};
use std::collections::BTreeSet;

/// Decides whether a file built for the given platforms can run here.
///
/// Any `Fn(&BTreeSet<String>) -> bool` is a policy, which keeps tests free
/// of host detection.
pub trait PlatformPolicy {
    fn is_compatible(&self, platforms: &BTreeSet<String>) -> bool;
}

impl<F> PlatformPolicy for F
where
    F: Fn(&BTreeSet<String>) -> bool,
{
    fn is_compatible(&self, platforms: &BTreeSet<String>) -> bool {
        self(platforms)
    }
}

/// Accepts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyPlatform;

impl PlatformPolicy for AnyPlatform {
    fn is_compatible(&self, _platforms: &BTreeSet<String>) -> bool {
        true
    }
}

/// Accepts files that declare no platform, or at least one of the platform
/// names this host answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    names: BTreeSet<String>,
}

impl HostPlatform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: BTreeSet::from([name.into()]),
        }
    }

    /// Also answer to `alias`, e.g. a generic "linux" next to "linux64".
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.insert(alias.into());
        self
    }

    /// Platform names for the machine this binary was built for, in the
    /// style update sites use (`linux64`, `win32`, `macosx`).
    pub fn detect() -> Self {
        let bits = if cfg!(target_pointer_width = "64") { "64" } else { "32" };
        match std::env::consts::OS {
            "macos" => Self::new("macosx"),
            "windows" => Self::new(format!("win{bits}")).with_alias("win"),
            "linux" => Self::new(format!("linux{bits}")).with_alias("linux"),
            other => Self::new(other),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}

impl PlatformPolicy for HostPlatform {
    fn is_compatible(&self, platforms: &BTreeSet<String>) -> bool {
        platforms.is_empty() || !platforms.is_disjoint(&self.names)
    }
}

/// Status and action derived for an incoming entry while reading an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub action: Action,
}

impl Classification {
    pub fn new(status: Status, action: Action) -> Self {
        Self { status, action }
    }

    /// The status together with the action that leaves the file alone.
    pub fn settled(status: Status) -> Self {
        Self::new(status, status.no_action())
    }
}

/// Derive the status of a freshly read entry.
///
/// A file with no current version is obsolete. A current version newer than
/// the last time its source was synced is new, and is marked for install
/// when the host can run it. Anything else keeps whatever status the
/// registry already holds, which is why `None` is returned.
pub fn classify<P>(entry: &FileEntry, last_synced: Timestamp, policy: &P) -> Option<Classification>
where
    P: PlatformPolicy + ?Sized,
{
    let Some(current) = entry.current() else {
        return Some(Classification::settled(Status::ObsoleteUninstalled));
    };
    if !current.is_newer_than(last_synced) {
        return None;
    }
    let action = if policy.is_compatible(&entry.platforms) {
        Action::Install
    } else {
        Action::New
    };
    Some(Classification::new(Status::New, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionRecord;
    use rstest::rstest;

    fn published(timestamp: u64, platforms: &[&str]) -> FileEntry {
        let mut entry = FileEntry::new("jars/foo.jar", "site1");
        entry.set_version(VersionRecord::new("abc", Timestamp::new(timestamp)));
        platforms.iter().for_each(|platform| entry.add_platform(*platform));
        entry
    }

    #[test]
    fn test_withdrawn_entry_is_obsolete() {
        let entry = FileEntry::new("jars/foo.jar", "site1");
        let classification = classify(&entry, Timestamp::ZERO, &AnyPlatform);
        assert_eq!(
            classification,
            Some(Classification::new(Status::ObsoleteUninstalled, Action::Obsolete))
        );
    }

    #[rstest]
    #[case(100, 50, Some(Classification::new(Status::New, Action::Install)))]
    #[case(100, 100, None)]
    #[case(100, 200, None)]
    fn test_new_relative_to_last_sync(
        #[case] published_at: u64,
        #[case] last_synced: u64,
        #[case] expected: Option<Classification>,
    ) {
        let entry = published(published_at, &[]);
        assert_eq!(classify(&entry, Timestamp::new(last_synced), &AnyPlatform), expected);
    }

    #[test]
    fn test_incompatible_platform_is_not_installed() {
        let entry = published(100, &["win64"]);
        let host = HostPlatform::new("linux64").with_alias("linux");
        let classification = classify(&entry, Timestamp::ZERO, &host);
        assert_eq!(classification, Some(Classification::new(Status::New, Action::New)));
    }

    #[rstest]
    #[case(&[], true)]
    #[case(&["linux64"], true)]
    #[case(&["linux", "win32"], true)]
    #[case(&["macosx"], false)]
    fn test_host_platform(#[case] platforms: &[&str], #[case] expected: bool) {
        let host = HostPlatform::new("linux64").with_alias("linux");
        let platforms = platforms.iter().map(|p| p.to_string()).collect();
        assert_eq!(host.is_compatible(&platforms), expected);
    }

    #[test]
    fn test_closure_policy() {
        let entry = published(100, &["anything"]);
        let never = |_: &BTreeSet<String>| false;
        let classification = classify(&entry, Timestamp::ZERO, &never);
        assert_eq!(classification.map(|c| c.action), Some(Action::New));
    }

    #[test]
    fn test_detect_names_something() {
        assert!(HostPlatform::detect().names().next().is_some());
    }
}
