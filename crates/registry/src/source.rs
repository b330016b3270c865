use upsite_model::{DEFAULT_SOURCE, Timestamp};

/// One update site the client knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    pub url: String,
    /// Directory on the upload host that maintainers publish into.
    pub upload_target: Option<String>,
    pub ssh_host: Option<String>,
    last_synced: Timestamp,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            upload_target: None,
            ssh_host: None,
            last_synced: Timestamp::ZERO,
        }
    }

    /// The source representing the user's own synchronized cache.
    pub fn local() -> Self {
        Self::new(DEFAULT_SOURCE, "")
    }

    pub fn with_upload_target(mut self, upload_target: impl Into<String>) -> Self {
        self.upload_target = Some(upload_target.into());
        self
    }

    pub fn with_ssh_host(mut self, ssh_host: impl Into<String>) -> Self {
        self.ssh_host = Some(ssh_host.into());
        self
    }

    pub fn with_last_synced(mut self, last_synced: Timestamp) -> Self {
        self.last_synced = last_synced;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical timestamp of the newest index this client has read from the
    /// source.
    pub fn last_synced(&self) -> Timestamp {
        self.last_synced
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_SOURCE
    }

    /// Move the last-synced marker forward. Returns `true` if it moved.
    pub fn advance(&mut self, timestamp: Timestamp) -> bool {
        if timestamp > self.last_synced {
            self.last_synced = timestamp;
            return true;
        }
        false
    }
}
