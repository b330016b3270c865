//! Configuration for upsite clients.
//!
//! Values are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults (see [`Config::default`]).
//! 2. An optional configuration file, TOML unless its extension says YAML
//!    or JSON.
//! 3. Environment variables prefixed with `UPSITE_`, e.g.
//!    `UPSITE_CONCURRENCY=8` or `UPSITE_CACHE_COMPRESSION=none`.
//!
//! ```toml
//! cache = "/var/lib/upsite/db.xml.gz"
//! concurrency = 2
//!
//! [[sources]]
//! name = "fiji"
//! url = "https://update.fiji.sc/"
//! ```

mod config;
pub mod error;

pub use crate::config::{Config, ENV_PREFIX, SourceConfig};
