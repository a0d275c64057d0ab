//! MergeService: orchestrates sources and deserializes to BridgeConfig.

use crate::config::sources::{environment, global_file, repository_file};
use crate::config::BridgeConfig;
use config::{ConfigError, File, FileFormat};
use std::path::Path;
use tracing::debug;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults -> global file -> repository file -> environment.
    pub fn load(root: &Path) -> Result<BridgeConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = repository_file::add_to_builder(builder, root)?;
        let builder = environment::add_to_builder(builder)?;
        debug!(root = %root.display(), "Loading configuration");
        builder.build()?.try_deserialize()
    }

    /// Precedence: defaults -> `path` -> environment.
    pub fn load_from_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::StrategyKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_repository_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".aip-bridge.toml"),
            r#"
[repository]
name = "Test store"
cmis_version = "1.0"

[users]
read_only = ["guest"]
read_write = ["archivist"]

[cache]
ttl_secs = 30

[query]
strategy = "tree-walk"
"#,
        )
        .unwrap();
        let config = MergeService::load(temp.path()).unwrap();
        assert_eq!(config.repository.name, "Test store");
        assert_eq!(config.repository.id, "aip");
        assert_eq!(config.users.read_only, vec!["guest"]);
        assert_eq!(config.cache.ttl_secs, Some(30));
        assert_eq!(config.query.strategy, StrategyKind::TreeWalk);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(MergeService::load_from_file(&temp.path().join("missing.toml")).is_err());
    }
}
