//! Path <-> ObjectId codec
//!
//! Object ids are the standard base64 encoding of the root-relative repository
//! path (`/unit/representations/rep1/data/file.txt`). The root is the only
//! path that maps to [`ROOT_ID`]. Decoding validates the path and refuses
//! symbolic links along it, so an id can never resolve outside the
//! repository root.

use crate::error::ApiError;
use crate::types::{ObjectId, ROOT_ID};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathIdentifierCodec {
    root: PathBuf,
}

impl PathIdentifierCodec {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encode an absolute path under the root.
    pub fn encode(&self, path: &Path) -> Result<ObjectId, ApiError> {
        let repo_path = self.relative_path(path)?;
        Ok(Self::encode_repo_path(&repo_path))
    }

    /// Encode an already root-relative repository path.
    pub fn encode_repo_path(repo_path: &str) -> ObjectId {
        if repo_path.is_empty() || repo_path == "/" {
            return ObjectId::root();
        }
        ObjectId::from(BASE64.encode(repo_path.as_bytes()))
    }

    /// Decode an id to its absolute path under the root.
    pub fn decode(&self, id: &ObjectId) -> Result<PathBuf, ApiError> {
        let repo_path = Self::decode_repo_path(id)?;
        self.resolve_path(&repo_path)
    }

    /// Decode an id to its root-relative repository path.
    pub fn decode_repo_path(id: &ObjectId) -> Result<String, ApiError> {
        let raw = id.as_str();
        if raw.is_empty() {
            return Err(ApiError::InvalidArgument("Id is empty".to_string()));
        }
        if raw == ROOT_ID {
            return Ok("/".to_string());
        }
        let bytes = BASE64
            .decode(raw)
            .map_err(|_| ApiError::InvalidArgument(format!("Id is not valid: {}", raw)))?;
        let repo_path = String::from_utf8(bytes)
            .map_err(|_| ApiError::InvalidArgument(format!("Id is not valid: {}", raw)))?;
        validate_repo_path(&repo_path)?;
        if repo_path == "/" {
            // "/" only ever encodes to the sentinel.
            return Err(ApiError::InvalidArgument(format!("Id is not valid: {}", raw)));
        }
        Ok(repo_path)
    }

    /// Root-relative, forward-slash, leading-slash form of an absolute path.
    pub fn relative_path(&self, path: &Path) -> Result<String, ApiError> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            ApiError::InvalidArgument(format!(
                "Path {} is outside the repository root",
                path.display()
            ))
        })?;
        let mut repo_path = String::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        ApiError::InvalidArgument(format!(
                            "Path {} is not valid UTF-8",
                            path.display()
                        ))
                    })?;
                    repo_path.push('/');
                    repo_path.push_str(name);
                }
                Component::CurDir => {}
                _ => {
                    return Err(ApiError::InvalidArgument(format!(
                        "Path {} escapes the repository root",
                        path.display()
                    )))
                }
            }
        }
        if repo_path.is_empty() {
            repo_path.push('/');
        }
        Ok(repo_path)
    }

    /// Resolve a validated repository path against the root.
    ///
    /// A symbolic link anywhere along the existing part of the path is
    /// reported as `NotFound`; the part that does not exist yet is not
    /// checked.
    pub fn resolve_path(&self, repo_path: &str) -> Result<PathBuf, ApiError> {
        validate_repo_path(repo_path)?;
        let mut path = self.root.clone();
        let mut existing = true;
        for segment in repo_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
            if existing {
                match fs::symlink_metadata(&path) {
                    Ok(metadata) if metadata.file_type().is_symlink() => {
                        return Err(ApiError::NotFound(repo_path.to_string()));
                    }
                    Ok(_) => {}
                    Err(_) => existing = false,
                }
            }
        }
        Ok(path)
    }
}

/// Accepts `/` and `/seg(/seg)*` with no empty, `.` or `..` segments.
pub fn validate_repo_path(repo_path: &str) -> Result<(), ApiError> {
    let rest = repo_path.strip_prefix('/').ok_or_else(|| {
        ApiError::InvalidArgument(format!("Path must start with '/': {}", repo_path))
    })?;
    if rest.is_empty() {
        return Ok(());
    }
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ApiError::InvalidArgument(format!(
                "Path has an invalid segment: {}",
                repo_path
            )));
        }
        if segment.contains('\0') || segment.contains('\\') {
            return Err(ApiError::InvalidArgument(format!(
                "Path has an invalid character: {}",
                repo_path
            )));
        }
    }
    Ok(())
}
