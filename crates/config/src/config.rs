use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use upsite_compress::Compression;
use upsite_model::{DEFAULT_SOURCE, HostPlatform};
use upsite_registry::{FileRegistry, Source, Sources};
use upsite_sync::{DEFAULT_CONCURRENCY, Session, TransportHandle};

pub const ENV_PREFIX: &str = "UPSITE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the local cache is loaded from and saved to.
    pub cache: PathBuf,
    /// Compression used when saving the local cache, `gzip` or `none`.
    /// Follows the extension of `cache` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_compression: Option<String>,
    /// Platform name files are classified against. Detected from the host
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Maximum number of index fetches in flight.
    pub concurrency: usize,
    pub sources: Vec<SourceConfig>,
}

/// A configured update site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
}

impl From<&SourceConfig> for Source {
    fn from(config: &SourceConfig) -> Self {
        let mut source = Source::new(config.name.as_str(), config.url.as_str());
        source.upload_target = config.upload_target.clone();
        source.ssh_host = config.ssh_host.clone();
        source
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: default_cache_path(),
            cache_compression: None,
            platform: None,
            concurrency: DEFAULT_CONCURRENCY,
            sources: Vec::new(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    let filename = Compression::default().index_filename("db");
    match ProjectDirs::from("org", "upsite", "upsite") {
        Some(dirs) => dirs.data_dir().join(filename),
        None => PathBuf::from(filename),
    }
}

impl Config {
    /// The layered providers, before extraction.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = match path.extension().and_then(|extension| extension.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration. A `path` that is given must
    /// exist; without one only defaults and the environment apply.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let config: Config = Self::figment(path).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        debug!(sources = config.sources.len(), cache = %config.cache.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".into()));
        }
        self.cache_compression()?;
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("source names cannot be empty".into()));
            }
            if source.name == DEFAULT_SOURCE {
                exn::bail!(ErrorKind::Invalid(format!("source name '{DEFAULT_SOURCE}' is reserved")));
            }
            if source.url.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid(format!("source '{}' has no URL", source.name)));
            }
            if !seen.insert(source.name.as_str()) {
                exn::bail!(ErrorKind::Invalid(format!("duplicate source '{}'", source.name)));
            }
        }
        Ok(())
    }

    pub fn cache_compression(&self) -> Result<Compression> {
        match &self.cache_compression {
            Some(name) => name
                .parse::<Compression>()
                .or_raise(|| ErrorKind::Invalid(format!("unsupported cache compression '{name}'"))),
            None => Ok(Compression::from_path(&self.cache)),
        }
    }

    pub fn platform_policy(&self) -> HostPlatform {
        match &self.platform {
            Some(platform) => HostPlatform::new(platform.as_str()),
            None => HostPlatform::detect(),
        }
    }

    /// Names of the configured sources, in configuration order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.name.as_str())
    }

    /// Add every configured source. Sources already present keep how far
    /// they have been synced.
    pub fn register_sources(&self, sources: &mut Sources) {
        for source in &self.sources {
            sources.add(Source::from(source));
        }
    }

    /// A session over a fresh registry holding the configured sources.
    pub fn session(&self, transport: TransportHandle) -> Session {
        let mut registry = FileRegistry::new();
        self.register_sources(registry.sources_mut());
        Session::new(registry, transport)
            .with_policy(self.platform_policy())
            .with_concurrency(self.concurrency)
    }
}
