//! Repository facade
//!
//! Wires the codec, unit cache, projector, index and executors together and
//! exposes the object surface: every call authenticates the caller against
//! the [`UserRegistry`] first.

pub mod content;
pub mod write;

pub use content::ContentStream;
pub use write::BulkUpdateResult;

use crate::acl::{AccessControlEvaluator, AceEntry, AllowableActions, UserRegistry};
use crate::codec::{validate_repo_path, PathIdentifierCodec};
use crate::config::BridgeConfig;
use crate::error::ApiError;
use crate::hierarchy::HierarchyProjector;
use crate::index::{MetadataIndex, SledMetadataIndex};
use crate::object::{
    ChildrenPage, ObjectData, ObjectInFolderContainer, ObjectList, ObjectOptions, ObjectParent,
};
use crate::properties::{ExtensionSniffer, MimeSniffer, PropertyFilter, PropertyProjector};
use crate::query::{self, IndexedExecutor, QueryStrategy, StrategyKind, TreeWalkExecutor};
use crate::schema::{SchemaCatalog, StaticCatalog, TypeSchema};
use crate::tree::RepositoryNode;
use crate::types::{CallContext, CmisVersion, ObjectId};
use crate::unit::{
    AipDescriptorProbe, MemoryUnitCache, MetadataExtractor, NoDescriptiveMetadata,
    PermissionProbe, UnitCache,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Descendant depth used when the caller gives none.
pub const DEFAULT_DESCENDANT_DEPTH: i64 = 2;

/// Static facts about the repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cmis_version: CmisVersion,
    pub root_folder_id: ObjectId,
    pub root_path: PathBuf,
    pub product_name: String,
    pub product_version: String,
    pub query_strategy: StrategyKind,
    pub indexed_objects: usize,
}

/// Per-call object options as a client sends them.
#[derive(Debug, Clone, Default)]
pub struct ObjectRequest {
    /// Comma-separated property filter; `None` or `*` selects everything.
    pub filter: Option<String>,
    pub include_allowable_actions: bool,
    pub include_acl: bool,
    pub include_path_segment: bool,
}

impl ObjectRequest {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_allowable_actions(mut self) -> Self {
        self.include_allowable_actions = true;
        self
    }

    pub fn with_acl(mut self) -> Self {
        self.include_acl = true;
        self
    }

    pub fn with_path_segment(mut self) -> Self {
        self.include_path_segment = true;
        self
    }
}

/// Assembles a [`Repository`] from its collaborators.
pub struct RepositoryBuilder {
    root: PathBuf,
    id: String,
    name: String,
    description: String,
    probe: Arc<dyn PermissionProbe>,
    extractor: Arc<dyn MetadataExtractor>,
    schema: Arc<dyn SchemaCatalog>,
    mime: Arc<dyn MimeSniffer>,
    index: Option<Arc<dyn MetadataIndex>>,
    users: Arc<UserRegistry>,
    ttl: Option<Duration>,
    strategy: StrategyKind,
    warm_on_open: bool,
}

impl RepositoryBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = BridgeConfig::default();
        Self {
            root: root.into(),
            id: defaults.repository.id,
            name: defaults.repository.name,
            description: defaults.repository.description,
            probe: Arc::new(AipDescriptorProbe::default()),
            extractor: Arc::new(NoDescriptiveMetadata),
            schema: Arc::new(StaticCatalog::standard()),
            mime: Arc::new(ExtensionSniffer),
            index: None,
            users: Arc::new(UserRegistry::new()),
            ttl: None,
            strategy: StrategyKind::default(),
            warm_on_open: true,
        }
    }

    pub fn identity(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.id = id.into();
        self.name = name.into();
        self.description = description.into();
        self
    }

    pub fn probe(mut self, probe: Arc<dyn PermissionProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn schema(mut self, schema: Arc<dyn SchemaCatalog>) -> Self {
        self.schema = schema;
        self
    }

    pub fn mime(mut self, mime: Arc<dyn MimeSniffer>) -> Self {
        self.mime = mime;
        self
    }

    pub fn index(mut self, index: Arc<dyn MetadataIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn users(mut self, users: Arc<UserRegistry>) -> Self {
        self.users = users;
        self
    }

    pub fn ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn warm_on_open(mut self, warm: bool) -> Self {
        self.warm_on_open = warm;
        self
    }

    /// Open the repository: reset the index and, if enabled, warm it.
    pub fn build(self) -> Result<Repository, ApiError> {
        let root = dunce::canonicalize(&self.root).map_err(|e| {
            ApiError::ConfigError(format!(
                "Repository root {} is not accessible: {}",
                self.root.display(),
                e
            ))
        })?;
        if !root.is_dir() {
            return Err(ApiError::ConfigError(format!(
                "Repository root {} is not a directory",
                root.display()
            )));
        }

        let index: Arc<dyn MetadataIndex> = match self.index {
            Some(index) => index,
            None => Arc::new(SledMetadataIndex::temporary()?),
        };
        index.reset()?;

        let codec = PathIdentifierCodec::new(&root);
        let units: Arc<dyn UnitCache> = Arc::new(
            MemoryUnitCache::new(&root, self.probe, self.extractor).with_ttl(self.ttl),
        );
        let projector = Arc::new(PropertyProjector::new(
            codec.clone(),
            self.schema,
            units.clone(),
            index.clone(),
            self.mime,
        ));
        let access = Arc::new(AccessControlEvaluator::new(self.users.clone()));
        let hierarchy = Arc::new(HierarchyProjector::new(projector, access));

        let repository = Repository {
            id: self.id,
            name: self.name,
            description: self.description,
            codec,
            users: self.users,
            units,
            index,
            tree_walk: TreeWalkExecutor::new(hierarchy.clone()),
            indexed: IndexedExecutor::new(hierarchy.clone()),
            hierarchy,
            strategy: self.strategy,
        };
        info!(root = %root.display(), strategy = %repository.strategy, "Repository opened");
        if self.warm_on_open {
            repository.warm_index();
        }
        Ok(repository)
    }
}

pub struct Repository {
    id: String,
    name: String,
    description: String,
    codec: PathIdentifierCodec,
    users: Arc<UserRegistry>,
    units: Arc<dyn UnitCache>,
    index: Arc<dyn MetadataIndex>,
    hierarchy: Arc<HierarchyProjector>,
    tree_walk: TreeWalkExecutor,
    indexed: IndexedExecutor,
    strategy: StrategyKind,
}

impl Repository {
    pub fn builder(root: impl Into<PathBuf>) -> RepositoryBuilder {
        RepositoryBuilder::new(root)
    }

    /// Open with a loaded configuration. `root` overrides the configured root.
    pub fn open(config: &BridgeConfig, root: Option<&Path>) -> Result<Self, ApiError> {
        let root = match (root, &config.repository.root) {
            (Some(root), _) => root.to_path_buf(),
            (None, Some(root)) => root.clone(),
            (None, None) => {
                return Err(ApiError::ConfigError(
                    "No repository root configured".to_string(),
                ))
            }
        };

        let users = Arc::new(UserRegistry::new());
        for user in &config.users.read_only {
            users.set_read_only(user)?;
        }
        for user in &config.users.read_write {
            users.set_read_write(user)?;
        }

        let index_path = config.index.resolve_path(&root)?;
        let index = Arc::new(SledMetadataIndex::open(&index_path)?);
        debug!(path = %index_path.display(), "Metadata index opened");

        Self::builder(&root)
            .identity(
                config.repository.id.clone(),
                config.repository.name.clone(),
                config.repository.description.clone(),
            )
            .probe(Arc::new(AipDescriptorProbe::new(
                config.repository.read_group.clone(),
            )))
            .index(index)
            .users(users)
            .ttl(config.cache.ttl())
            .strategy(config.query.strategy)
            .warm_on_open(config.index.warm_on_open)
            .build()
    }

    pub fn root(&self) -> &Path {
        self.codec.root()
    }

    pub fn codec(&self) -> &PathIdentifierCodec {
        &self.codec
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn hierarchy(&self) -> &HierarchyProjector {
        &self.hierarchy
    }

    pub fn index(&self) -> &dyn MetadataIndex {
        self.index.as_ref()
    }

    /// Re-crawl the visible content into the index.
    pub fn warm_index(&self) -> usize {
        self.hierarchy.warm_index()
    }

    /// Drop the cached permission and metadata of one unit.
    pub fn invalidate_unit(&self, unit_id: &str) {
        self.units.invalidate(unit_id);
    }

    fn schema(&self) -> &dyn SchemaCatalog {
        self.hierarchy.projector().schema()
    }

    fn options(
        &self,
        ctx: &CallContext,
        user_read_only: bool,
        request: &ObjectRequest,
    ) -> Result<ObjectOptions, ApiError> {
        Ok(ObjectOptions {
            filter: PropertyFilter::parse(request.filter.as_deref())?,
            include_allowable_actions: request.include_allowable_actions,
            include_acl: request.include_acl,
            include_path_segment: request.include_path_segment,
            cmis_version: ctx.cmis_version,
            user_read_only,
        })
    }

    pub fn repository_info(&self, ctx: &CallContext) -> Result<RepositoryInfo, ApiError> {
        self.users.check_user(ctx, false)?;
        Ok(RepositoryInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            cmis_version: ctx.cmis_version,
            root_folder_id: ObjectId::root(),
            root_path: self.root().to_path_buf(),
            product_name: env!("CARGO_PKG_NAME").to_string(),
            product_version: env!("CARGO_PKG_VERSION").to_string(),
            query_strategy: self.strategy,
            indexed_objects: self.index.len()?,
        })
    }

    pub fn type_definition(&self, ctx: &CallContext, type_id: &str) -> Result<TypeSchema, ApiError> {
        self.users.check_user(ctx, false)?;
        self.schema()
            .resolve(type_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Type not found: {}", type_id)))
    }

    /// Direct subtypes of `parent`, or the base types when `None`.
    pub fn type_children(
        &self,
        ctx: &CallContext,
        parent: Option<&str>,
    ) -> Result<Vec<TypeSchema>, ApiError> {
        self.users.check_user(ctx, false)?;
        if let Some(parent) = parent {
            if self.schema().type_definition(parent).is_none() {
                return Err(ApiError::NotFound(format!("Type not found: {}", parent)));
            }
        }
        Ok(self
            .schema()
            .type_children(parent)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn get_object(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        request: &ObjectRequest,
    ) -> Result<ObjectData, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        let node = self.hierarchy.visible_node(id)?;
        self.hierarchy.object(&node, &options, true)
    }

    /// Look an object up by its root-relative path (`/` for the root).
    pub fn get_object_by_path(
        &self,
        ctx: &CallContext,
        path: &str,
        request: &ObjectRequest,
    ) -> Result<ObjectData, ApiError> {
        validate_repo_path(path)?;
        let id = PathIdentifierCodec::encode_repo_path(path);
        self.get_object(ctx, &id, request)
    }

    pub fn get_children(
        &self,
        ctx: &CallContext,
        folder_id: &ObjectId,
        request: &ObjectRequest,
        skip: i64,
        max: i64,
    ) -> Result<ChildrenPage, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        self.hierarchy.list_children(folder_id, &options, skip, max)
    }

    pub fn get_descendants(
        &self,
        ctx: &CallContext,
        folder_id: &ObjectId,
        depth: Option<i64>,
        request: &ObjectRequest,
    ) -> Result<Vec<ObjectInFolderContainer>, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        self.hierarchy.list_descendants(
            folder_id,
            depth.unwrap_or(DEFAULT_DESCENDANT_DEPTH),
            false,
            &options,
        )
    }

    pub fn get_folder_tree(
        &self,
        ctx: &CallContext,
        folder_id: &ObjectId,
        depth: Option<i64>,
        request: &ObjectRequest,
    ) -> Result<Vec<ObjectInFolderContainer>, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        self.hierarchy.get_folder_tree(
            folder_id,
            depth.unwrap_or(DEFAULT_DESCENDANT_DEPTH),
            &options,
        )
    }

    pub fn get_folder_parent(
        &self,
        ctx: &CallContext,
        folder_id: &ObjectId,
        request: &ObjectRequest,
    ) -> Result<ObjectData, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        if !folder_id.is_root() {
            let node = self.hierarchy.visible_node(folder_id)?;
            if !node.is_folder() {
                return Err(ApiError::InvalidArgument(format!(
                    "Not a folder: {}",
                    folder_id
                )));
            }
        }
        self.hierarchy.get_parent(folder_id, &options)
    }

    pub fn get_object_parents(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
        request: &ObjectRequest,
    ) -> Result<Vec<ObjectParent>, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        self.hierarchy.get_object_parents(id, &options)
    }

    pub fn get_allowable_actions(
        &self,
        ctx: &CallContext,
        id: &ObjectId,
    ) -> Result<AllowableActions, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let node = self.hierarchy.visible_node(id)?;
        Ok(self.hierarchy.access().allowable_actions(&node, read_only))
    }

    pub fn get_acl(&self, ctx: &CallContext, id: &ObjectId) -> Result<Vec<AceEntry>, ApiError> {
        self.users.check_user(ctx, false)?;
        let node = self.hierarchy.visible_node(id)?;
        Ok(self.hierarchy.access().acl(&node))
    }

    /// Run a query with the configured strategy.
    pub fn query(
        &self,
        ctx: &CallContext,
        statement: &str,
        request: &ObjectRequest,
        skip: i64,
        max: i64,
    ) -> Result<ObjectList, ApiError> {
        self.query_with(ctx, statement, request, skip, max, self.strategy)
    }

    pub fn query_with(
        &self,
        ctx: &CallContext,
        statement: &str,
        request: &ObjectRequest,
        skip: i64,
        max: i64,
        strategy: StrategyKind,
    ) -> Result<ObjectList, ApiError> {
        let read_only = self.users.check_user(ctx, false)?;
        let options = self.options(ctx, read_only, request)?;
        let parsed = query::parse(statement, self.schema())?;
        debug!(statement, %strategy, "Running query");
        let executor: &dyn QueryStrategy = match strategy {
            StrategyKind::Indexed => &self.indexed,
            StrategyKind::TreeWalk => &self.tree_walk,
        };
        executor.execute(&parsed, &options, skip, max)
    }

    /// Visible node for a write, after the caller is cleared for writing.
    fn writable_node(&self, ctx: &CallContext, id: &ObjectId) -> Result<RepositoryNode, ApiError> {
        self.users.check_user(ctx, true)?;
        self.hierarchy.visible_node(id)
    }
}
