//! Metadata index
//!
//! Durable side-store of projected property bags. It is not a source of
//! truth: it is cleared when the repository opens and refilled every time a
//! visible node is projected with write-through. Indexed queries read it and
//! re-stat the hits against the live file system.

pub mod persistence;

pub use persistence::SledMetadataIndex;

use crate::error::StorageError;
use crate::properties::PropertyBag;
use crate::query::Predicate;
use crate::schema::BaseType;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

/// Storage class an object type is indexed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    Folder,
    ArchivalDocument,
}

impl StorageClass {
    pub fn of(base: BaseType) -> Self {
        match base {
            BaseType::Folder => StorageClass::Folder,
            BaseType::Document => StorageClass::ArchivalDocument,
        }
    }
}

/// Indexed projection of one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: ObjectId,
    pub class: StorageClass,
    pub repo_path: String,
    /// Folder the object is listed under after the depth policy.
    pub container_path: String,
    /// Unfiltered property set.
    pub properties: PropertyBag,
}

/// Which records a query considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexScope {
    All,
    /// Records whose container path equals the given path.
    Container(String),
    /// Records strictly below the given path.
    Subtree(String),
}

/// Compiled form of a query statement against the index.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub class: StorageClass,
    pub scope: IndexScope,
    pub predicate: Option<Predicate>,
}

/// Metadata index interface
pub trait MetadataIndex: Send + Sync {
    /// Drop every record.
    fn reset(&self) -> Result<(), StorageError>;

    /// Insert or replace the record for `record.id`.
    fn upsert(&self, record: &IndexRecord) -> Result<(), StorageError>;

    fn get(&self, id: &ObjectId) -> Result<Option<IndexRecord>, StorageError>;

    fn remove(&self, id: &ObjectId) -> Result<bool, StorageError>;

    /// Remove the record at `repo_path` and every record below it.
    fn remove_subtree(&self, repo_path: &str) -> Result<usize, StorageError>;

    /// Matching records, in index order.
    fn query(&self, query: &IndexQuery) -> Result<Vec<IndexRecord>, StorageError>;

    fn len(&self) -> Result<usize, StorageError>;
}
