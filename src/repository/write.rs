//! Object-changing operations
//!
//! Writes only land inside representation data. Every successful change
//! drops the stale index records it leaves behind and re-projects what it
//! created, so the indexed query path stays in step with the file system.

use super::Repository;
use crate::codec::PathIdentifierCodec;
use crate::error::ApiError;
use crate::object::{ObjectData, ObjectOptions};
use crate::properties::{PropertyBag, PropertyFilter, PropertyValue};
use crate::schema::{ids, BaseType, Updatability, ARCHIVAL_DOCUMENT_TYPE, FOLDER_TYPE};
use crate::tree::{zone_of, RepositoryNode, Zone};
use crate::types::{CallContext, CmisVersion, ObjectId};
use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of a bulk property update.
#[derive(Debug, Default)]
pub struct BulkUpdateResult {
    /// `(old id, new id)` pairs, in request order.
    pub updated: Vec<(ObjectId, ObjectId)>,
    pub failed: Vec<(ObjectId, ApiError)>,
}

/// Accepts names that map to a single visible file-system entry.
fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(ApiError::InvalidArgument(format!("Name is reserved: {}", name)));
    }
    if name.contains(['/', '\\', ':', '\0']) {
        return Err(ApiError::InvalidArgument(format!(
            "Name has an invalid character: {}",
            name
        )));
    }
    if name.starts_with('.') {
        return Err(ApiError::InvalidArgument(format!(
            "Name would be hidden: {}",
            name
        )));
    }
    Ok(())
}

fn child_repo_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

fn require_content(repo_path: &str, action: &str) -> Result<(), ApiError> {
    if zone_of(repo_path) != Zone::Content {
        return Err(ApiError::Constraint(format!(
            "Cannot {} outside representation data: {}",
            action, repo_path
        )));
    }
    Ok(())
}

fn conflict_or_io(err: io::Error, repo_path: &str) -> ApiError {
    if err.kind() == io::ErrorKind::AlreadyExists {
        ApiError::NameConflict(format!("Object already exists: {}", repo_path))
    } else {
        ApiError::from_node_io(err, repo_path)
    }
}

impl Repository {
    fn folder_target(&self, ctx: &CallContext, id: &ObjectId) -> Result<RepositoryNode, ApiError> {
        let folder = self.writable_node(ctx, id)?;
        if !folder.is_folder() {
            return Err(ApiError::InvalidArgument(format!("Not a folder: {}", id)));
        }
        Ok(folder)
    }

    fn document_target(&self, ctx: &CallContext, id: &ObjectId) -> Result<RepositoryNode, ApiError> {
        let document = self.writable_node(ctx, id)?;
        if !document.is_document() {
            return Err(ApiError::InvalidArgument(format!("Not a document: {}", id)));
        }
        require_content(&document.repo_path, "change content")?;
        if !document.writable {
            return Err(ApiError::Constraint(format!(
                "Document is read-only: {}",
                document.repo_path
            )));
        }
        Ok(document)
    }

    fn check_type(&self, type_id: &str, base: BaseType) -> Result<(), ApiError> {
        let schema = self
            .schema()
            .resolve(type_id)
            .ok_or_else(|| ApiError::InvalidArgument(format!("Unknown type: {}", type_id)))?;
        if schema.base != base {
            return Err(ApiError::InvalidArgument(format!(
                "Type {} is not a {} type",
                type_id,
                base.id()
            )));
        }
        if !schema.creatable {
            return Err(ApiError::Constraint(format!("Type is not creatable: {}", type_id)));
        }
        Ok(())
    }

    /// Re-project a node, and everything below a folder, into the index.
    fn reindex(&self, path: &Path) {
        let projector = self.hierarchy.projector();
        let node = match RepositoryNode::stat(self.codec(), path) {
            Ok(node) => node,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot re-index changed object");
                return;
            }
        };
        let below: Vec<RepositoryNode> = if node.is_folder() {
            self.hierarchy.walk_below(&node.path).collect()
        } else {
            Vec::new()
        };
        for node in std::iter::once(node).chain(below) {
            if let Err(e) = projector.project(&node, &PropertyFilter::All, CmisVersion::default(), true) {
                warn!(path = %node.repo_path, error = %e, "Cannot re-index changed object");
            }
        }
    }

    fn unindex(&self, repo_path: &str) {
        match self.index.remove_subtree(repo_path) {
            Ok(removed) => debug!(path = repo_path, removed, "Dropped index records"),
            Err(e) => warn!(path = repo_path, error = %e, "Failed to drop index records"),
        }
    }

    /// Create a document under `parent_id`, optionally with initial content.
    pub fn create_document(
        &self,
        ctx: &CallContext,
        parent_id: &ObjectId,
        name: &str,
        type_id: Option<&str>,
        content: Option<&mut dyn Read>,
    ) -> Result<ObjectId, ApiError> {
        let parent = self.folder_target(ctx, parent_id)?;
        validate_name(name)?;
        self.check_type(type_id.unwrap_or(ARCHIVAL_DOCUMENT_TYPE), BaseType::Document)?;
        let repo_path = child_repo_path(&parent.repo_path, name);
        require_content(&repo_path, "create documents")?;

        let path = parent.path.join(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| conflict_or_io(e, &repo_path))?;
        if let Some(content) = content {
            if let Err(e) = io::copy(content, &mut file) {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path) {
                    warn!(path = %repo_path, error = %cleanup, "Failed to remove partial document");
                }
                return Err(ApiError::io(e));
            }
        }
        info!(path = %repo_path, "Document created");
        self.reindex(&path);
        Ok(PathIdentifierCodec::encode_repo_path(&repo_path))
    }

    pub fn create_folder(
        &self,
        ctx: &CallContext,
        parent_id: &ObjectId,
        name: &str,
        type_id: Option<&str>,
    ) -> Result<ObjectId, ApiError> {
        let parent = self.folder_target(ctx, parent_id)?;
        validate_name(name)?;
        self.check_type(type_id.unwrap_or(FOLDER_TYPE), BaseType::Folder)?;
        let repo_path = child_repo_path(&parent.repo_path, name);
        require_content(&repo_path, "create folders")?;

        let path = parent.path.join(name);
        fs::create_dir(&path).map_err(|e| conflict_or_io(e, &repo_path))?;
        info!(path = %repo_path, "Folder created");
        self.reindex(&path);
        Ok(PathIdentifierCodec::encode_repo_path(&repo_path))
    }

    /// Move an object into `target_folder_id`. Returns the moved object.
    pub fn move_object(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        target_folder_id: &ObjectId,
    ) -> Result<ObjectData, ApiError> {
        if id.is_root() {
            return Err(ApiError::InvalidArgument("The root cannot be moved".to_string()));
        }
        let node = self.writable_node(ctx, id)?;
        require_content(&node.repo_path, "move objects")?;
        let target = self.folder_target(ctx, target_folder_id)?;
        if node.is_folder() && target.path.starts_with(&node.path) {
            return Err(ApiError::InvalidArgument(format!(
                "Cannot move {} into itself",
                node.repo_path
            )));
        }
        let repo_path = child_repo_path(&target.repo_path, &node.name);
        require_content(&repo_path, "move objects")?;
        let destination = target.path.join(&node.name);
        self.rename_node(&node, &destination, &repo_path)?;
        let moved = RepositoryNode::stat(self.codec(), &destination)?;
        let options = ObjectOptions {
            cmis_version: ctx.cmis_version,
            user_read_only: false,
            ..Default::default()
        };
        self.hierarchy.object(&moved, &options, true)
    }

    fn rename_node(
        &self,
        node: &RepositoryNode,
        destination: &Path,
        repo_path: &str,
    ) -> Result<ObjectId, ApiError> {
        if destination.symlink_metadata().is_ok() {
            return Err(ApiError::NameConflict(format!(
                "Object already exists: {}",
                repo_path
            )));
        }
        fs::rename(&node.path, destination).map_err(|e| conflict_or_io(e, &node.repo_path))?;
        info!(from = %node.repo_path, to = repo_path, "Object moved");
        self.unindex(&node.repo_path);
        self.reindex(destination);
        Ok(PathIdentifierCodec::encode_repo_path(repo_path))
    }

    /// Replace the content of a document. Without `overwrite`, existing
    /// content is a constraint violation.
    pub fn set_content_stream(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        overwrite: bool,
        content: &mut dyn Read,
    ) -> Result<ObjectId, ApiError> {
        let document = self.document_target(ctx, id)?;
        if !overwrite && document.size > 0 {
            return Err(ApiError::Constraint(format!(
                "Document already has content: {}",
                document.repo_path
            )));
        }
        let mut file = fs::File::create(&document.path)
            .map_err(|e| ApiError::from_node_io(e, &document.repo_path))?;
        let written = io::copy(content, &mut file).map_err(ApiError::io)?;
        debug!(path = %document.repo_path, written, "Content replaced");
        self.reindex(&document.path);
        Ok(id.clone())
    }

    pub fn append_content_stream(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        content: &mut dyn Read,
    ) -> Result<ObjectId, ApiError> {
        let document = self.document_target(ctx, id)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&document.path)
            .map_err(|e| ApiError::from_node_io(e, &document.repo_path))?;
        let written = io::copy(content, &mut file).map_err(ApiError::io)?;
        debug!(path = %document.repo_path, written, "Content appended");
        self.reindex(&document.path);
        Ok(id.clone())
    }

    /// Truncate a document to zero length.
    pub fn delete_content_stream(&self, ctx: &CallContext, id: &ObjectId) -> Result<ObjectId, ApiError> {
        let document = self.document_target(ctx, id)?;
        if document.size == 0 {
            return Err(ApiError::Constraint(format!(
                "Document has no content: {}",
                document.repo_path
            )));
        }
        fs::File::create(&document.path)
            .map_err(|e| ApiError::from_node_io(e, &document.repo_path))?;
        self.reindex(&document.path);
        Ok(id.clone())
    }

    /// Delete a document or an empty folder.
    pub fn delete_object(&self, ctx: &CallContext, id: &ObjectId) -> Result<(), ApiError> {
        if id.is_root() {
            return Err(ApiError::InvalidArgument("The root cannot be deleted".to_string()));
        }
        let node = self.writable_node(ctx, id)?;
        require_content(&node.repo_path, "delete objects")?;
        if node.is_folder() {
            let mut entries =
                fs::read_dir(&node.path).map_err(|e| ApiError::from_node_io(e, &node.repo_path))?;
            if entries.next().is_some() {
                return Err(ApiError::Constraint(format!(
                    "Folder is not empty: {}",
                    node.repo_path
                )));
            }
            fs::remove_dir(&node.path).map_err(|e| ApiError::from_node_io(e, &node.repo_path))?;
        } else {
            fs::remove_file(&node.path).map_err(|e| ApiError::from_node_io(e, &node.repo_path))?;
        }
        info!(path = %node.repo_path, "Object deleted");
        self.unindex(&node.repo_path);
        Ok(())
    }

    /// Delete a folder and everything below it. Returns the ids that could
    /// not be deleted; the walk stops at the first failure unless
    /// `continue_on_failure` is set.
    pub fn delete_tree(
        &self,
        ctx: &CallContext,
        folder_id: &ObjectId,
        continue_on_failure: bool,
    ) -> Result<Vec<ObjectId>, ApiError> {
        if folder_id.is_root() {
            return Err(ApiError::InvalidArgument("The root cannot be deleted".to_string()));
        }
        let folder = self.folder_target(ctx, folder_id)?;
        require_content(&folder.repo_path, "delete objects")?;

        let mut failed = Vec::new();
        for entry in WalkDir::new(&folder.path).contents_first(true) {
            let (path, result) = match entry {
                Ok(entry) => {
                    let result = if entry.file_type().is_dir() {
                        fs::remove_dir(entry.path())
                    } else {
                        fs::remove_file(entry.path())
                    };
                    (entry.into_path(), result)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| folder.path.clone());
                    (path, Err(io::Error::from(e)))
                }
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Delete failed");
                failed.push(self.codec().encode(&path).unwrap_or_else(|_| folder_id.clone()));
                if !continue_on_failure {
                    break;
                }
            }
        }
        info!(path = %folder.repo_path, failed = failed.len(), "Tree deleted");
        self.unindex(&folder.repo_path);
        if !failed.is_empty() {
            self.reindex(&folder.path);
        }
        Ok(failed)
    }

    /// Apply property changes. Only `cmis:name` has a file-system effect;
    /// other updatable properties are accepted and not stored.
    pub fn update_properties(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        properties: &PropertyBag,
    ) -> Result<ObjectId, ApiError> {
        let node = self.writable_node(ctx, id)?;
        let schema = self.hierarchy.projector().type_of(&node)?;
        let mut new_name = None;
        for (key, value) in properties.iter() {
            let definition = schema
                .property(key)
                .or_else(|| schema.property_by_query_name(key))
                .ok_or_else(|| {
                    ApiError::Constraint(format!("Unknown property for {}: {}", schema.id, key))
                })?;
            if definition.updatability != Updatability::ReadWrite {
                return Err(ApiError::Constraint(format!(
                    "Property is not updatable: {}",
                    definition.id
                )));
            }
            if definition.id == ids::NAME {
                match value {
                    PropertyValue::String(name) => new_name = Some(name.clone()),
                    _ => {
                        return Err(ApiError::InvalidArgument(
                            "Name must be a string".to_string(),
                        ))
                    }
                }
            }
        }

        let Some(name) = new_name.filter(|name| *name != node.name) else {
            return Ok(id.clone());
        };
        validate_name(&name)?;
        if node.is_root() {
            return Err(ApiError::Constraint("The root cannot be renamed".to_string()));
        }
        require_content(&node.repo_path, "rename objects")?;
        let parent = node.parent_repo_path().unwrap_or_else(|| "/".to_string());
        let repo_path = child_repo_path(&parent, &name);
        let destination = node
            .path
            .parent()
            .map(|dir| dir.join(&name))
            .ok_or_else(|| ApiError::InvalidArgument("The root cannot be renamed".to_string()))?;
        self.rename_node(&node, &destination, &repo_path)
    }

    /// Apply the same property changes to many objects, collecting per-object
    /// failures instead of stopping.
    pub fn bulk_update_properties(
        &self,
        ctx: &CallContext,
        object_ids: &[ObjectId],
        properties: &PropertyBag,
    ) -> Result<BulkUpdateResult, ApiError> {
        self.users.check_user(ctx, true)?;
        let mut result = BulkUpdateResult::default();
        for id in object_ids {
            match self.update_properties(ctx, id, properties) {
                Ok(new_id) => result.updated.push((id.clone(), new_id)),
                Err(e) => {
                    debug!(id = %id, error = %e, "Bulk update item failed");
                    result.failed.push((id.clone(), e));
                }
            }
        }
        Ok(result)
    }
}
