//! aip-bridge: an archival package store as a content repository
//!
//! Archival units on disk (`<unit>/representations/<rep>/data/...`) are
//! presented as a folder hierarchy of documents and folders with typed
//! properties, permission-filtered listings and a small query language.
//! The file system is the source of truth; a sled index mirrors projected
//! properties for fast queries.

pub mod acl;
pub mod codec;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod logging;
pub mod object;
pub mod pagination;
pub mod properties;
pub mod query;
pub mod repository;
pub mod schema;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod unit;

pub use error::ApiError;
pub use repository::{ObjectRequest, Repository, RepositoryBuilder};
pub use types::{CallContext, CmisVersion, ObjectId};
