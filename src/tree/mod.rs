//! Repository tree: file-system nodes and the visible-content walker.

pub mod node;
pub mod walker;

pub use node::{is_hidden_name, zone_of, NodeKind, RepositoryNode, Zone};
pub use walker::ContentWalker;
