//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/aip-bridge/config.toml`), the repository file
//! (`<root>/.aip-bridge.toml`) or an explicit file, then `AIPBRIDGE__*`
//! environment variables.

pub mod facade;
pub mod merge {
    pub mod merge_policy;
    pub mod service;
}
pub mod paths {
    pub mod xdg_root;
}
pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod repository_file;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::query::StrategyKind;
use crate::types::CmisVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_repository_id() -> String {
    "aip".to_string()
}

fn default_repository_name() -> String {
    "Archival package store".to_string()
}

fn default_read_group() -> String {
    "cmis".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_id")]
    pub id: String,

    #[serde(default = "default_repository_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Store root; the CLI falls back to the current directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub cmis_version: CmisVersion,

    /// Group a unit descriptor must grant READ to.
    #[serde(default = "default_read_group")]
    pub read_group: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            id: default_repository_id(),
            name: default_repository_name(),
            description: String::new(),
            root: None,
            cmis_version: CmisVersion::default(),
            read_group: default_read_group(),
        }
    }
}

/// Registered principals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersConfig {
    #[serde(default)]
    pub read_only: Vec<String>,
    #[serde(default)]
    pub read_write: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index directory; `None` uses `$XDG_DATA_HOME/aip-bridge/<root>/index`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Crawl the visible content when the repository opens.
    #[serde(default = "default_true")]
    pub warm_on_open: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: None,
            warm_on_open: true,
        }
    }
}

impl IndexConfig {
    /// Resolve the index directory. Relative paths are taken from the root.
    pub fn resolve_path(&self, root: &Path) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(root.join(path)),
            None => Ok(xdg::repository_data_dir(root)?.join("index")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Unit cache lifetime in seconds; `None` caches for the process lifetime.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
}

impl BridgeConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Configured root, or `fallback` when none is set.
    pub fn root_or(&self, fallback: &Path) -> PathBuf {
        self.repository
            .root
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}
