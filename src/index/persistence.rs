//! Sled-backed metadata index
//!
//! Layout:
//! - `folder` / `archivalDocument`: repo path -> bincode `IndexRecord`
//! - `ids`: object id -> repo path
//! - `containers`: `<container>\0<repo path>` -> empty, for one-level scans
//!
//! Writes touch several trees and are serialized by one index-wide lock;
//! reads go straight to sled.

use super::{IndexQuery, IndexRecord, IndexScope, MetadataIndex, StorageClass};
use crate::error::StorageError;
use crate::types::ObjectId;
use parking_lot::Mutex;
use std::io;
use std::path::Path;
use tracing::debug;

pub struct SledMetadataIndex {
    db: sled::Db,
    folders: sled::Tree,
    documents: sled::Tree,
    ids: sled::Tree,
    containers: sled::Tree,
    write_lock: Mutex<()>,
}

impl SledMetadataIndex {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    /// In-memory index removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            folders: db.open_tree("folder")?,
            documents: db.open_tree("archivalDocument")?,
            ids: db.open_tree("ids")?,
            containers: db.open_tree("containers")?,
            db,
            write_lock: Mutex::new(()),
        })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn tree(&self, class: StorageClass) -> &sled::Tree {
        match class {
            StorageClass::Folder => &self.folders,
            StorageClass::ArchivalDocument => &self.documents,
        }
    }

    fn container_key(container: &str, repo_path: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(container.len() + repo_path.len() + 1);
        key.extend_from_slice(container.as_bytes());
        key.push(0);
        key.extend_from_slice(repo_path.as_bytes());
        key
    }

    fn decode(bytes: &[u8]) -> Result<IndexRecord, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn remove_path_locked(&self, repo_path: &str) -> Result<bool, StorageError> {
        let mut removed = false;
        for class in [StorageClass::Folder, StorageClass::ArchivalDocument] {
            if let Some(bytes) = self.tree(class).remove(repo_path.as_bytes())? {
                let record = Self::decode(&bytes)?;
                self.ids.remove(record.id.as_str().as_bytes())?;
                self.containers
                    .remove(Self::container_key(&record.container_path, repo_path))?;
                removed = true;
            }
        }
        Ok(removed)
    }

    fn collect(
        &self,
        query: &IndexQuery,
        iter: impl Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
        out: &mut Vec<IndexRecord>,
    ) -> Result<(), StorageError> {
        for item in iter {
            let (_, bytes) = item?;
            let record = Self::decode(&bytes)?;
            if query
                .predicate
                .as_ref()
                .map(|p| p.matches(&record.properties))
                .unwrap_or(true)
            {
                out.push(record);
            }
        }
        Ok(())
    }
}

impl MetadataIndex for SledMetadataIndex {
    fn reset(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        for tree in [&self.folders, &self.documents, &self.ids, &self.containers] {
            tree.clear()?;
        }
        debug!("Metadata index reset");
        Ok(())
    }

    fn upsert(&self, record: &IndexRecord) -> Result<(), StorageError> {
        let bytes = bincode::serialize(record)?;
        let _guard = self.write_lock.lock();
        // A path may have changed kind since it was last indexed.
        self.remove_path_locked(&record.repo_path)?;
        self.tree(record.class)
            .insert(record.repo_path.as_bytes(), bytes)?;
        self.ids
            .insert(record.id.as_str().as_bytes(), record.repo_path.as_bytes())?;
        self.containers.insert(
            Self::container_key(&record.container_path, &record.repo_path),
            &[] as &[u8],
        )?;
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> Result<Option<IndexRecord>, StorageError> {
        let Some(path) = self.ids.get(id.as_str().as_bytes())? else {
            return Ok(None);
        };
        for class in [StorageClass::Folder, StorageClass::ArchivalDocument] {
            if let Some(bytes) = self.tree(class).get(&path)? {
                return Ok(Some(Self::decode(&bytes)?));
            }
        }
        Ok(None)
    }

    fn remove(&self, id: &ObjectId) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock();
        let Some(path) = self.ids.get(id.as_str().as_bytes())? else {
            return Ok(false);
        };
        let repo_path = String::from_utf8_lossy(&path).into_owned();
        self.remove_path_locked(&repo_path)
    }

    fn remove_subtree(&self, repo_path: &str) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock();
        let mut paths = vec![repo_path.to_string()];
        let prefix = format!("{}/", repo_path.trim_end_matches('/'));
        for class in [StorageClass::Folder, StorageClass::ArchivalDocument] {
            for item in self.tree(class).scan_prefix(prefix.as_bytes()) {
                let (key, _) = item?;
                paths.push(String::from_utf8_lossy(&key).into_owned());
            }
        }
        let mut removed = 0;
        for path in paths {
            if self.remove_path_locked(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn query(&self, query: &IndexQuery) -> Result<Vec<IndexRecord>, StorageError> {
        let tree = self.tree(query.class);
        let mut out = Vec::new();
        match &query.scope {
            IndexScope::All => self.collect(query, tree.iter(), &mut out)?,
            IndexScope::Subtree(path) => {
                let prefix = format!("{}/", path.trim_end_matches('/'));
                self.collect(query, tree.scan_prefix(prefix.as_bytes()), &mut out)?
            }
            IndexScope::Container(container) => {
                let mut prefix = container.as_bytes().to_vec();
                prefix.push(0);
                for item in self.containers.scan_prefix(&prefix) {
                    let (key, _) = item?;
                    let repo_path = &key[prefix.len()..];
                    if let Some(bytes) = tree.get(repo_path)? {
                        let record = Self::decode(&bytes)?;
                        if query
                            .predicate
                            .as_ref()
                            .map(|p| p.matches(&record.properties))
                            .unwrap_or(true)
                        {
                            out.push(record);
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.folders.len() + self.documents.len())
    }
}
