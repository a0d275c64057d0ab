//! Folder hierarchy as clients see it
//!
//! The store is not listed as it sits on disk. The root lists the content of
//! every readable unit (the children of each `representations/<rep>/data`),
//! administrative folders redirect to that same listing, and content folders
//! list normally. Hidden entries and unreadable units never appear.

use crate::acl::AccessControlEvaluator;
use crate::error::ApiError;
use crate::object::{
    ChildrenPage, ObjectData, ObjectInFolder, ObjectInFolderContainer, ObjectOptions, ObjectParent,
};
use crate::pagination::Paginator;
use crate::properties::{PropertyFilter, PropertyProjector};
use crate::tree::node::parent_of;
use crate::tree::{is_hidden_name, ContentWalker, RepositoryNode, Zone};
use crate::types::{CmisVersion, ObjectId};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Folder whose effective children a listing enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// Content of every readable unit.
    Root,
    /// A content folder, listed normally.
    Folder(String),
}

impl ListingSource {
    /// Container path the index stores for the children of this source.
    pub fn container_path(&self) -> &str {
        match self {
            ListingSource::Root => "/",
            ListingSource::Folder(path) => path,
        }
    }
}

pub struct HierarchyProjector {
    projector: Arc<PropertyProjector>,
    access: Arc<AccessControlEvaluator>,
}

impl HierarchyProjector {
    pub fn new(projector: Arc<PropertyProjector>, access: Arc<AccessControlEvaluator>) -> Self {
        Self { projector, access }
    }

    pub fn projector(&self) -> &PropertyProjector {
        &self.projector
    }

    pub fn access(&self) -> &AccessControlEvaluator {
        &self.access
    }

    /// Readability of a unit; probe failures read as unreadable.
    pub fn unit_readable(&self, unit_id: &str) -> bool {
        match self.projector.units().permission_and_metadata(unit_id) {
            Ok(unit) => unit.can_read,
            Err(e) => {
                warn!(unit = unit_id, error = %e, "Treating unit as unreadable");
                false
            }
        }
    }

    /// True if clients may see the node at all.
    pub fn is_visible(&self, node: &RepositoryNode) -> Result<bool, ApiError> {
        if node.is_root() {
            return Ok(true);
        }
        if node.zone() == Zone::Hidden || node.segments().any(is_hidden_name) {
            return Ok(false);
        }
        let Some(unit_id) = node.unit_id() else {
            return Ok(false);
        };
        // Files lying directly under the root are not units.
        if node.depth() == 1 && !node.is_folder() {
            return Ok(false);
        }
        Ok(self.projector.units().permission_and_metadata(unit_id)?.can_read)
    }

    /// Resolve an id to a node clients may see.
    pub fn visible_node(&self, id: &ObjectId) -> Result<RepositoryNode, ApiError> {
        let path = self.projector.codec().decode(id)?;
        let node = RepositoryNode::stat(self.projector.codec(), &path)?;
        if !self.is_visible(&node)? {
            return Err(ApiError::NotFound(format!("Object not found: {}", id)));
        }
        Ok(node)
    }

    /// Resolve a folder id for listing. Administrative folders of unreadable
    /// units still resolve; they list the root.
    pub fn listing_node(&self, id: &ObjectId) -> Result<RepositoryNode, ApiError> {
        let path = self.projector.codec().decode(id)?;
        let node = RepositoryNode::stat(self.projector.codec(), &path)?;
        if node.segments().any(is_hidden_name) {
            return Err(ApiError::NotFound(format!("Folder not found: {}", id)));
        }
        Ok(node)
    }

    /// Compile the client view of a node.
    pub fn object(
        &self,
        node: &RepositoryNode,
        options: &ObjectOptions,
        write_through: bool,
    ) -> Result<ObjectData, ApiError> {
        let projection =
            self.projector
                .project(node, &options.filter, options.cmis_version, write_through)?;
        let allowable_actions = options
            .include_allowable_actions
            .then(|| self.access.allowable_actions(node, options.user_read_only));
        let acl = options.include_acl.then(|| self.access.acl(node));
        Ok(ObjectData {
            id: projection.id,
            base_type: projection.base,
            type_id: projection.type_id,
            has_content: projection.has_content,
            properties: projection.properties,
            allowable_actions,
            acl,
        })
    }

    /// Which folder a listing of `folder` enumerates.
    pub fn listing_source(&self, folder: &RepositoryNode) -> Result<ListingSource, ApiError> {
        if !folder.is_folder() {
            return Err(ApiError::InvalidArgument(format!(
                "Not a folder: {}",
                folder.repo_path
            )));
        }
        let not_found = || ApiError::NotFound(format!("Folder not found: {}", folder.repo_path));
        match folder.zone() {
            Zone::Root | Zone::Administrative => Ok(ListingSource::Root),
            Zone::Content => {
                if self.is_visible(folder)? {
                    Ok(ListingSource::Folder(folder.repo_path.clone()))
                } else {
                    Err(not_found())
                }
            }
            Zone::Hidden => Err(not_found()),
        }
    }

    /// Effective children in file-system enumeration order.
    pub fn effective_children(&self, source: &ListingSource) -> Result<Vec<RepositoryNode>, ApiError> {
        let codec = self.projector.codec();
        match source {
            ListingSource::Folder(repo_path) => {
                let path = codec.resolve_path(repo_path)?;
                self.read_dir(&path)
            }
            ListingSource::Root => {
                let mut children = Vec::new();
                for unit in self.read_dir(codec.root())? {
                    if !unit.is_folder() || !self.unit_readable(&unit.name) {
                        continue;
                    }
                    let representations = unit.path.join("representations");
                    if !representations.is_dir() {
                        continue;
                    }
                    for rep in self.read_dir(&representations)? {
                        let data = rep.path.join("data");
                        if rep.is_folder() && data.is_dir() {
                            children.extend(self.read_dir(&data)?);
                        }
                    }
                }
                Ok(children)
            }
        }
    }

    /// Non-hidden entries of `dir`; symbolic links and entries that vanish
    /// while being read are skipped.
    fn read_dir(&self, dir: &Path) -> Result<Vec<RepositoryNode>, ApiError> {
        let codec = self.projector.codec();
        let entries = fs::read_dir(dir).map_err(|e| {
            ApiError::from_node_io(e, &dir.display().to_string())
        })?;
        let mut nodes = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if is_hidden_name(&entry.file_name().to_string_lossy()) {
                continue;
            }
            if entry.file_type().map(|t| t.is_symlink()).unwrap_or(false) {
                continue;
            }
            match RepositoryNode::stat(codec, &entry.path()) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping vanished entry");
                }
            }
        }
        Ok(nodes)
    }

    fn in_folder(&self, node: &RepositoryNode, options: &ObjectOptions) -> Result<ObjectInFolder, ApiError> {
        Ok(ObjectInFolder {
            object: self.object(node, options, true)?,
            path_segment: options.include_path_segment.then(|| node.name.clone()),
        })
    }

    pub fn list_children(
        &self,
        folder_id: &ObjectId,
        options: &ObjectOptions,
        skip: i64,
        max: i64,
    ) -> Result<ChildrenPage, ApiError> {
        let folder = self.listing_node(folder_id)?;
        let source = self.listing_source(&folder)?;
        let children = self.effective_children(&source)?;
        debug!(folder = %folder.repo_path, count = children.len(), "Listing children");

        let mut paginator = Paginator::new(skip, max);
        let mut items = Vec::new();
        for child in &children {
            if !paginator.offer() {
                continue;
            }
            match self.in_folder(child, options) {
                Ok(item) => items.push(item),
                Err(e) if e.is_not_found() => {
                    warn!(path = %child.repo_path, "Child vanished before projection");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(paginator.finish(items))
    }

    /// Descendant trees; `depth < 0` is unlimited, `0` is rejected.
    pub fn list_descendants(
        &self,
        folder_id: &ObjectId,
        depth: i64,
        folders_only: bool,
        options: &ObjectOptions,
    ) -> Result<Vec<ObjectInFolderContainer>, ApiError> {
        if depth == 0 {
            return Err(ApiError::InvalidArgument("Depth must not be 0".to_string()));
        }
        let folder = self.listing_node(folder_id)?;
        let source = self.listing_source(&folder)?;
        self.descend(&source, depth, folders_only, options)
    }

    pub fn get_folder_tree(
        &self,
        folder_id: &ObjectId,
        depth: i64,
        options: &ObjectOptions,
    ) -> Result<Vec<ObjectInFolderContainer>, ApiError> {
        self.list_descendants(folder_id, depth, true, options)
    }

    fn descend(
        &self,
        source: &ListingSource,
        depth: i64,
        folders_only: bool,
        options: &ObjectOptions,
    ) -> Result<Vec<ObjectInFolderContainer>, ApiError> {
        let mut containers = Vec::new();
        for child in self.effective_children(source)? {
            if folders_only && !child.is_folder() {
                continue;
            }
            let object = match self.in_folder(&child, options) {
                Ok(object) => object,
                Err(e) if e.is_not_found() => {
                    warn!(path = %child.repo_path, "Descendant vanished before projection");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let children = if child.is_folder() && depth != 1 {
                let source = self.listing_source(&child)?;
                self.descend(&source, depth - 1, folders_only, options)?
            } else {
                Vec::new()
            };
            containers.push(ObjectInFolderContainer { object, children });
        }
        Ok(containers)
    }

    /// File-system parent of an object.
    pub fn get_parent(&self, object_id: &ObjectId, options: &ObjectOptions) -> Result<ObjectData, ApiError> {
        if object_id.is_root() {
            return Err(ApiError::InvalidArgument("The root has no parent".to_string()));
        }
        let node = self.visible_node(object_id)?;
        let parent = self.parent_node(&node)?;
        self.object(&parent, options, true)
    }

    pub fn get_object_parents(
        &self,
        object_id: &ObjectId,
        options: &ObjectOptions,
    ) -> Result<Vec<ObjectParent>, ApiError> {
        if object_id.is_root() {
            return Ok(Vec::new());
        }
        let node = self.visible_node(object_id)?;
        let parent = self.parent_node(&node)?;
        Ok(vec![ObjectParent {
            object: self.object(&parent, options, true)?,
            relative_path_segment: options.include_path_segment.then(|| node.name.clone()),
        }])
    }

    fn parent_node(&self, node: &RepositoryNode) -> Result<RepositoryNode, ApiError> {
        let parent = parent_of(&node.repo_path).ok_or_else(|| {
            ApiError::InvalidArgument("The root has no parent".to_string())
        })?;
        RepositoryNode::at_repo_path(self.projector.codec(), &parent)
    }

    /// Lazily walk visible content strictly below `start`.
    pub fn walk_below<'a>(&'a self, start: &Path) -> ContentWalker<'a> {
        ContentWalker::new(self.projector.codec(), start, move |unit| self.unit_readable(unit))
    }

    /// Lazily walk every visible content node.
    pub fn visible_universe(&self) -> ContentWalker<'_> {
        self.walk_below(self.projector.codec().root())
    }

    /// Project every visible node with write-through. Returns the number of
    /// nodes indexed.
    pub fn warm_index(&self) -> usize {
        let mut indexed = 0;
        for node in self.visible_universe() {
            match self
                .projector
                .project(&node, &PropertyFilter::All, CmisVersion::default(), true)
            {
                Ok(_) => indexed += 1,
                Err(e) => warn!(path = %node.repo_path, error = %e, "Skipping node during warm-up"),
            }
        }
        info!(indexed, "Metadata index warmed");
        indexed
    }
}
