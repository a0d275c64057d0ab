//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::BridgeConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the standard files and the environment.
    pub fn load(root: &Path) -> Result<BridgeConfig, ConfigError> {
        MergeService::load(root)
    }

    /// Load from a specific file with the environment on top.
    pub fn load_from_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    pub fn default() -> BridgeConfig {
        BridgeConfig::default()
    }
}
