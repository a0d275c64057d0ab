//! Error types for the repository bridge.
//!
//! Every fallible operation returns [`ApiError`]. The variants form a closed
//! taxonomy that a protocol binding maps one-to-one onto its own fault codes.

use std::io;
use thiserror::Error;

/// Failures of the durable side-stores (file system, sled index).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("index error: {0}")]
    Index(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Repository-level error kinds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed id, bad filter, wrong target kind, malformed query, depth 0.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Object, unit or type absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown user, or a write attempted by a read-only user.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Create or move target already exists.
    #[error("name conflict: {0}")]
    NameConflict(String),

    /// Operation not allowed in the current object state.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    /// Unexpected failure in an external collaborator, with its cause.
    #[error("runtime failure: {message}")]
    Runtime {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    pub fn runtime(message: impl Into<String>, source: anyhow::Error) -> Self {
        ApiError::Runtime {
            message: message.into(),
            source,
        }
    }

    pub fn io(err: io::Error) -> Self {
        ApiError::StorageError(StorageError::IoError(err))
    }

    /// Maps a file-system error on a specific node: a vanished entry is
    /// `NotFound`, anything else is a storage failure.
    pub fn from_node_io(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            ApiError::NotFound(what.to_string())
        } else {
            ApiError::io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        ApiError::io(err)
    }
}

impl From<sled::Error> for ApiError {
    fn from(err: sled::Error) -> Self {
        ApiError::StorageError(StorageError::Index(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_maps_to_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(ApiError::from_node_io(err, "/U1/x").is_not_found());

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            ApiError::from_node_io(err, "/U1/x"),
            ApiError::StorageError(StorageError::IoError(_))
        ));
    }

    #[test]
    fn test_runtime_keeps_source() {
        let err = ApiError::runtime("extract failed", anyhow::anyhow!("bad xml"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("bad xml"));
    }
}
