//! Lazy walk over visible content nodes.
//!
//! Yields every content-zone node below a starting folder, skipping hidden
//! entries and units the caller reports as unreadable. Administrative
//! folders are traversed but never yielded. The iterator can be dropped at
//! any point without finishing the traversal.

use crate::codec::PathIdentifierCodec;
use crate::tree::node::{is_hidden_name, RepositoryNode, Zone};
use std::path::Path;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

pub struct ContentWalker<'a> {
    codec: &'a PathIdentifierCodec,
    inner: Option<walkdir::FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool + 'a>>>,
}

impl<'a> ContentWalker<'a> {
    /// Walk below `start`. `readable` is consulted once per unit folder.
    pub fn new<F>(codec: &'a PathIdentifierCodec, start: &Path, mut readable: F) -> Self
    where
        F: FnMut(&str) -> bool + 'a,
    {
        let start_depth = match codec.relative_path(start) {
            Ok(repo_path) => {
                let segments: Vec<&str> =
                    repo_path.split('/').filter(|s| !s.is_empty()).collect();
                if let Some(unit) = segments.first() {
                    if !readable(unit) {
                        return Self { codec, inner: None };
                    }
                }
                segments.len()
            }
            Err(e) => {
                warn!(path = %start.display(), error = %e, "Walk start outside repository root");
                return Self { codec, inner: None };
            }
        };

        let filter: Box<dyn FnMut(&DirEntry) -> bool + 'a> = Box::new(move |entry: &DirEntry| {
            let name = entry.file_name().to_string_lossy();
            if is_hidden_name(&name) {
                return false;
            }
            let depth = start_depth + entry.depth();
            let is_dir = entry.file_type().is_dir();
            match depth {
                1 => is_dir && readable(&name),
                2 => is_dir && name == "representations",
                3 => is_dir,
                4 => is_dir && name == "data",
                _ => true,
            }
        });

        let inner = WalkDir::new(start).min_depth(1).into_iter().filter_entry(filter);
        Self {
            codec,
            inner: Some(inner),
        }
    }
}

impl<'a> Iterator for ContentWalker<'a> {
    type Item = RepositoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        loop {
            let entry = match inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry during walk");
                    continue;
                }
            };
            if entry.path_is_symlink() {
                continue;
            }
            match RepositoryNode::stat(self.codec, entry.path()) {
                Ok(node) if node.zone() == Zone::Content => return Some(node),
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Node vanished during walk");
                    continue;
                }
            }
        }
    }
}

impl std::fmt::Debug for ContentWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentWalker")
            .field("root", &self.codec.root())
            .field("exhausted", &self.inner.is_none())
            .finish()
    }
}
