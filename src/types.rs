//! Core types shared across the repository bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier reserved for the repository root.
pub const ROOT_ID: &str = "@root@";

/// Author recorded on every object; no real authorship is tracked.
pub const UNKNOWN_USER: &str = "<unknown>";

/// Name of the per-unit permission descriptor.
pub const UNIT_DESCRIPTOR: &str = "aip.json";

/// ObjectId: opaque, reversible encoding of a root-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn root() -> Self {
        ObjectId(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        ObjectId(value)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        ObjectId(value.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Protocol revision the caller speaks; gates a handful of properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CmisVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    #[default]
    V1_1,
}

impl CmisVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1.0" => Some(CmisVersion::V1_0),
            "1.1" => Some(CmisVersion::V1_1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CmisVersion::V1_0 => "1.0",
            CmisVersion::V1_1 => "1.1",
        }
    }
}

/// Caller identity attached to every repository request.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub username: Option<String>,
    pub cmis_version: CmisVersion,
}

impl CallContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            cmis_version: CmisVersion::default(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            username: None,
            cmis_version: CmisVersion::default(),
        }
    }

    pub fn with_version(mut self, version: CmisVersion) -> Self {
        self.cmis_version = version;
        self
    }
}
