//! Repository nodes and their visibility zones

use crate::codec::PathIdentifierCodec;
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Folder,
    Document,
}

/// Where a path sits relative to the archival package layout.
///
/// ```text
/// /                                   Root            depth 0
/// /U1                                 Administrative  depth 1
/// /U1/representations/rep1/data       Administrative  depth 4
/// /U1/representations/rep1/data/a     Content         depth 5
/// /U1/metadata/descriptive/x/y        Hidden          depth 5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Root,
    Administrative,
    Content,
    Hidden,
}

/// Depth of the first content level (direct children of a `data` folder).
pub const CONTENT_DEPTH: usize = 5;

/// File-system entry under the repository root, re-read on every access.
#[derive(Debug, Clone)]
pub struct RepositoryNode {
    pub path: PathBuf,
    /// Root-relative path with a leading `/`; `/` for the root.
    pub repo_path: String,
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub writable: bool,
}

impl RepositoryNode {
    /// Stat an absolute path under the root.
    pub fn stat(codec: &PathIdentifierCodec, path: &Path) -> Result<Self, ApiError> {
        let repo_path = codec.relative_path(path)?;
        let metadata =
            fs::symlink_metadata(path).map_err(|e| ApiError::from_node_io(e, &repo_path))?;
        if metadata.file_type().is_symlink() {
            return Err(ApiError::NotFound(repo_path));
        }
        let kind = if metadata.is_dir() {
            NodeKind::Folder
        } else {
            NodeKind::Document
        };
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(ApiError::io)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            repo_path,
            name,
            kind,
            size: if kind == NodeKind::Document { metadata.len() } else { 0 },
            modified,
            writable: !metadata.permissions().readonly(),
        })
    }

    /// Stat a root-relative repository path.
    pub fn at_repo_path(codec: &PathIdentifierCodec, repo_path: &str) -> Result<Self, ApiError> {
        let path = codec.resolve_path(repo_path)?;
        Self::stat(codec, &path)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.repo_path.split('/').filter(|s| !s.is_empty())
    }

    /// Root-relative depth: 0 for the root, 1 for a unit folder.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Owning archival unit: the first path segment.
    pub fn unit_id(&self) -> Option<&str> {
        self.segments().next()
    }

    pub fn is_root(&self) -> bool {
        self.repo_path == "/"
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }

    pub fn is_hidden(&self) -> bool {
        is_hidden_name(&self.name)
    }

    pub fn zone(&self) -> Zone {
        zone_of(&self.repo_path)
    }

    /// Repository path of the file-system parent; `None` for the root.
    pub fn parent_repo_path(&self) -> Option<String> {
        parent_of(&self.repo_path)
    }

    /// Folder this node is listed under once the depth policy is applied:
    /// the root for first-level content, the real parent deeper down.
    pub fn container_path(&self) -> Option<String> {
        if self.zone() == Zone::Content && self.depth() == CONTENT_DEPTH {
            return Some("/".to_string());
        }
        self.parent_repo_path()
    }
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

pub fn parent_of(repo_path: &str) -> Option<String> {
    if repo_path == "/" {
        return None;
    }
    match repo_path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(i) => Some(repo_path[..i].to_string()),
        None => None,
    }
}

pub fn zone_of(repo_path: &str) -> Zone {
    let segments: Vec<&str> = repo_path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.len() {
        0 => Zone::Root,
        1..=4 => Zone::Administrative,
        _ if segments[1] == "representations" && segments[3] == "data" => Zone::Content,
        _ => Zone::Hidden,
    }
}
