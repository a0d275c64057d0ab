//! Query execution strategies
//!
//! [`TreeWalkExecutor`] enumerates candidates from the live file system.
//! [`IndexedExecutor`] compiles the statement into an [`IndexQuery`] and
//! re-stats every hit. Both restrict candidates to the same visible set and
//! use the same predicate evaluator, so a warmed index gives the same matches
//! as a walk.

use crate::error::ApiError;
use crate::hierarchy::{HierarchyProjector, ListingSource};
use crate::index::{IndexQuery, IndexScope, StorageClass};
use crate::object::{ObjectList, ObjectOptions};
use crate::pagination::Paginator;
use crate::properties::PropertyFilter;
use crate::query::QueryStatement;
use crate::tree::RepositoryNode;
use crate::types::CmisVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configured execution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Indexed,
    TreeWalk,
}

impl FromStr for StrategyKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indexed" | "index" => Ok(StrategyKind::Indexed),
            "tree-walk" | "treewalk" | "walk" => Ok(StrategyKind::TreeWalk),
            other => Err(ApiError::InvalidArgument(format!(
                "Unknown query strategy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Indexed => f.write_str("indexed"),
            StrategyKind::TreeWalk => f.write_str("tree-walk"),
        }
    }
}

pub trait QueryStrategy: Send + Sync {
    /// Run a parsed statement. `options` supplies everything but the property
    /// filter, which comes from the statement's field list.
    fn execute(
        &self,
        statement: &QueryStatement,
        options: &ObjectOptions,
        skip: i64,
        max: i64,
    ) -> Result<ObjectList, ApiError>;
}

/// Candidate set of a statement.
enum Scope {
    /// Every visible content node.
    Universe,
    /// Effective children of a folder.
    Children(ListingSource),
    /// Visible nodes strictly below a folder.
    Below(RepositoryNode),
}

struct Plan {
    class: StorageClass,
    scope: Scope,
    options: ObjectOptions,
}

fn plan(
    hierarchy: &HierarchyProjector,
    statement: &QueryStatement,
    options: &ObjectOptions,
) -> Result<Plan, ApiError> {
    let schema = hierarchy
        .projector()
        .schema()
        .type_definition(statement.type_id())
        .ok_or_else(|| {
            ApiError::InvalidArgument(format!("Unknown type: {}", statement.type_id()))
        })?;
    let scope = match statement {
        QueryStatement::Simple { .. } | QueryStatement::Where { .. } => Scope::Universe,
        QueryStatement::InFolder { folder_id, .. } => {
            let folder = hierarchy.listing_node(folder_id)?;
            Scope::Children(hierarchy.listing_source(&folder)?)
        }
        QueryStatement::InTree { subtree_id, .. } => {
            let folder = hierarchy.listing_node(subtree_id)?;
            // Validates the folder the same way a listing would.
            hierarchy.listing_source(&folder)?;
            Scope::Below(folder)
        }
    };
    Ok(Plan {
        class: StorageClass::of(schema.base),
        scope,
        options: ObjectOptions {
            filter: statement.fields().to_filter(),
            ..options.clone()
        },
    })
}

fn in_class(node: &RepositoryNode, class: StorageClass) -> bool {
    match class {
        StorageClass::Folder => node.is_folder(),
        StorageClass::ArchivalDocument => node.is_document(),
    }
}

/// Evaluates statements against the live file system.
pub struct TreeWalkExecutor {
    hierarchy: Arc<HierarchyProjector>,
}

impl TreeWalkExecutor {
    pub fn new(hierarchy: Arc<HierarchyProjector>) -> Self {
        Self { hierarchy }
    }

    fn candidates<'a>(
        &'a self,
        scope: &Scope,
    ) -> Result<Box<dyn Iterator<Item = RepositoryNode> + 'a>, ApiError> {
        Ok(match scope {
            Scope::Universe => Box::new(self.hierarchy.visible_universe()),
            Scope::Children(source) => {
                Box::new(self.hierarchy.effective_children(source)?.into_iter())
            }
            Scope::Below(folder) => Box::new(self.hierarchy.walk_below(&folder.path)),
        })
    }
}

impl QueryStrategy for TreeWalkExecutor {
    fn execute(
        &self,
        statement: &QueryStatement,
        options: &ObjectOptions,
        skip: i64,
        max: i64,
    ) -> Result<ObjectList, ApiError> {
        let plan = plan(&self.hierarchy, statement, options)?;
        let projector = self.hierarchy.projector();
        let mut paginator = Paginator::new(skip, max);
        let mut items = Vec::new();

        for node in self.candidates(&plan.scope)? {
            if !in_class(&node, plan.class) {
                continue;
            }
            if let Some(predicate) = statement.predicate() {
                let projection = match projector.project(
                    &node,
                    &PropertyFilter::All,
                    CmisVersion::default(),
                    false,
                ) {
                    Ok(projection) => projection,
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                };
                if !predicate.matches(&projection.properties) {
                    continue;
                }
            }
            if !paginator.offer() {
                continue;
            }
            match self.hierarchy.object(&node, &plan.options, false) {
                Ok(object) => items.push(object),
                Err(e) if e.is_not_found() => {
                    warn!(path = %node.repo_path, "Query hit vanished before projection");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(matches = paginator.seen(), strategy = "tree-walk", "Query executed");
        Ok(paginator.finish(items))
    }
}

/// Evaluates statements against the metadata index.
pub struct IndexedExecutor {
    hierarchy: Arc<HierarchyProjector>,
}

impl IndexedExecutor {
    pub fn new(hierarchy: Arc<HierarchyProjector>) -> Self {
        Self { hierarchy }
    }

    fn compile(&self, statement: &QueryStatement, plan: &Plan) -> IndexQuery {
        let scope = match &plan.scope {
            Scope::Universe => IndexScope::All,
            Scope::Children(source) => IndexScope::Container(source.container_path().to_string()),
            Scope::Below(folder) => IndexScope::Subtree(folder.repo_path.clone()),
        };
        IndexQuery {
            class: plan.class,
            scope,
            predicate: statement.predicate().cloned(),
        }
    }
}

impl QueryStrategy for IndexedExecutor {
    fn execute(
        &self,
        statement: &QueryStatement,
        options: &ObjectOptions,
        skip: i64,
        max: i64,
    ) -> Result<ObjectList, ApiError> {
        let plan = plan(&self.hierarchy, statement, options)?;
        let query = self.compile(statement, &plan);
        let projector = self.hierarchy.projector();
        let records = projector.index().query(&query)?;

        let mut paginator = Paginator::new(skip, max);
        let mut items = Vec::new();
        for record in records {
            let node = match RepositoryNode::at_repo_path(projector.codec(), &record.repo_path) {
                Ok(node) => node,
                Err(e) if e.is_not_found() => {
                    debug!(path = %record.repo_path, "Indexed object no longer exists");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !in_class(&node, plan.class) || !self.hierarchy.is_visible(&node)? {
                continue;
            }
            if !paginator.offer() {
                continue;
            }
            match self.hierarchy.object(&node, &plan.options, false) {
                Ok(object) => items.push(object),
                Err(e) if e.is_not_found() => {
                    warn!(path = %node.repo_path, "Query hit vanished before projection");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(matches = paginator.seen(), strategy = "indexed", "Query executed");
        Ok(paginator.finish(items))
    }
}
