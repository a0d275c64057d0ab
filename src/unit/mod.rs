//! Archival units
//!
//! An archival unit is a top-level folder of the store. It carries a
//! permission descriptor (`aip.json`) and descriptive metadata; both are
//! read once and shared through the [`UnitCache`].

pub mod cache;
pub mod probe;

pub use cache::{MemoryUnitCache, UnitCache};
pub use probe::{AipDescriptorProbe, MetadataExtractor, NoDescriptiveMetadata, PermissionProbe};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// One descriptive-metadata record: property id -> raw source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptiveRecord {
    fields: BTreeMap<String, String>,
}

impl DescriptiveRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(id, value);
        self
    }

    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(id.into(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.fields.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Descriptive metadata of a unit, one record per source schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBundle {
    /// Descriptive-archival record (EAD).
    pub archival: DescriptiveRecord,
    /// Descriptive-simple record (Dublin Core).
    pub simple: DescriptiveRecord,
    pub key_value: DescriptiveRecord,
}

impl MetadataBundle {
    pub fn is_empty(&self) -> bool {
        self.archival.is_empty() && self.simple.is_empty() && self.key_value.is_empty()
    }

    /// Every field of the three records.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.archival
            .iter()
            .chain(self.simple.iter())
            .chain(self.key_value.iter())
    }
}

/// Cached permission and metadata for one unit.
#[derive(Debug, Clone)]
pub struct ArchivalUnit {
    pub id: String,
    pub can_read: bool,
    pub metadata: MetadataBundle,
    pub loaded_at: Instant,
}

impl ArchivalUnit {
    pub fn unreadable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            can_read: false,
            metadata: MetadataBundle::default(),
            loaded_at: Instant::now(),
        }
    }

    pub fn readable(id: impl Into<String>, metadata: MetadataBundle) -> Self {
        Self {
            id: id.into(),
            can_read: true,
            metadata,
            loaded_at: Instant::now(),
        }
    }
}
