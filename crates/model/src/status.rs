use std::fmt::{Display, Formatter, Result as FmtResult};

/// Where a file stands relative to what this client has observed.
///
/// Index parsing only ever derives [`New`](Self::New) and
/// [`ObsoleteUninstalled`](Self::ObsoleteUninstalled); the remaining states
/// are assigned by the pass that compares the registry with the files
/// actually present on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Published, not present locally.
    #[default]
    NotInstalled,
    /// Present locally and matching the current version.
    Installed,
    /// Present locally as a previous version.
    Updateable,
    /// Present locally with content no source ever published.
    Modified,
    /// Present locally, unknown to every source.
    LocalOnly,
    /// A version this client has never seen asserted by its source.
    New,
    /// Withdrawn by its source, still present locally.
    Obsolete,
    /// Withdrawn by its source, present locally with modified content.
    ObsoleteModified,
    /// Withdrawn by its source and not present locally.
    ObsoleteUninstalled,
}
impl Status {
    /// Returns the display string used in logs and index dumps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotInstalled => "NOT_INSTALLED",
            Status::Installed => "INSTALLED",
            Status::Updateable => "UPDATEABLE",
            Status::Modified => "MODIFIED",
            Status::LocalOnly => "LOCAL_ONLY",
            Status::New => "NEW",
            Status::Obsolete => "OBSOLETE",
            Status::ObsoleteModified => "OBSOLETE_MODIFIED",
            Status::ObsoleteUninstalled => "OBSOLETE_UNINSTALLED",
        }
    }

    /// The action that leaves a file in this status untouched.
    pub fn no_action(&self) -> Action {
        match self {
            Status::NotInstalled => Action::NotInstalled,
            Status::Installed => Action::Installed,
            Status::Updateable => Action::Updateable,
            Status::Modified => Action::Modified,
            Status::LocalOnly => Action::LocalOnly,
            Status::New => Action::New,
            Status::Obsolete | Status::ObsoleteModified | Status::ObsoleteUninstalled => Action::Obsolete,
        }
    }

    pub fn is_obsolete(&self) -> bool {
        matches!(self, Status::Obsolete | Status::ObsoleteModified | Status::ObsoleteUninstalled)
    }
}
impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// What should happen to a file on the next install run.
///
/// The first group mirrors [`Status`] and means "leave it as it is"; the
/// second group are requests for the installer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    NotInstalled,
    Installed,
    Updateable,
    Modified,
    LocalOnly,
    New,
    Obsolete,
    Install,
    Update,
    Uninstall,
    Upload,
    Remove,
}
impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NotInstalled => "NOT_INSTALLED",
            Action::Installed => "INSTALLED",
            Action::Updateable => "UPDATEABLE",
            Action::Modified => "MODIFIED",
            Action::LocalOnly => "LOCAL_ONLY",
            Action::New => "NEW",
            Action::Obsolete => "OBSOLETE",
            Action::Install => "INSTALL",
            Action::Update => "UPDATE",
            Action::Uninstall => "UNINSTALL",
            Action::Upload => "UPLOAD",
            Action::Remove => "REMOVE",
        }
    }

    /// Returns `true` if the action asks the installer to do something.
    pub fn is_pending(&self) -> bool {
        matches!(self, Action::Install | Action::Update | Action::Uninstall | Action::Upload | Action::Remove)
    }
}
impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Status::New, Action::New)]
    #[case(Status::Installed, Action::Installed)]
    #[case(Status::ObsoleteUninstalled, Action::Obsolete)]
    fn test_no_action(#[case] status: Status, #[case] expected: Action) {
        assert_eq!(status.no_action(), expected);
        assert!(!status.no_action().is_pending());
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::ObsoleteUninstalled.to_string(), "OBSOLETE_UNINSTALLED");
        assert_eq!(Action::Install.to_string(), "INSTALL");
    }
}
