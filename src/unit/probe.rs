//! Boundary traits for unit permission and metadata sources

use crate::unit::MetadataBundle;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Decides whether a unit may be exposed, given its descriptor path.
pub trait PermissionProbe: Send + Sync {
    fn can_read(&self, descriptor: &Path) -> bool;
}

/// Extracts the descriptive metadata of a unit, given its descriptor path.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, descriptor: &Path) -> anyhow::Result<MetadataBundle>;
}

/// Grants read access when `permissions.groups.READ` lists the configured group.
#[derive(Debug, Clone)]
pub struct AipDescriptorProbe {
    group: String,
}

impl AipDescriptorProbe {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }
}

impl Default for AipDescriptorProbe {
    fn default() -> Self {
        Self::new("cmis")
    }
}

impl PermissionProbe for AipDescriptorProbe {
    fn can_read(&self, descriptor: &Path) -> bool {
        let raw = match fs::read_to_string(descriptor) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %descriptor.display(), error = %e, "No readable unit descriptor");
                return false;
            }
        };
        let json: Value = match serde_json::from_str(&raw) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %descriptor.display(), error = %e, "Malformed unit descriptor");
                return false;
            }
        };
        json.pointer("/permissions/groups/READ")
            .and_then(Value::as_array)
            .map(|groups| groups.iter().any(|g| g.as_str() == Some(self.group.as_str())))
            .unwrap_or(false)
    }
}

/// Extractor used when no descriptive-metadata parser is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDescriptiveMetadata;

impl MetadataExtractor for NoDescriptiveMetadata {
    fn extract(&self, _descriptor: &Path) -> anyhow::Result<MetadataBundle> {
        Ok(MetadataBundle::default())
    }
}
