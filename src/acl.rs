//! Allowable actions, ACLs and the user registry

use crate::error::ApiError;
use crate::tree::RepositoryNode;
use crate::types::CallContext;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

pub const PERMISSION_READ: &str = "cmis:read";
pub const PERMISSION_WRITE: &str = "cmis:write";
pub const PERMISSION_ALL: &str = "cmis:all";

/// Action a caller may perform on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Action {
    GetObjectParents,
    GetProperties,
    UpdateProperties,
    MoveObject,
    DeleteObject,
    GetAcl,
    GetDescendants,
    GetChildren,
    GetFolderParent,
    GetFolderTree,
    CreateDocument,
    CreateFolder,
    DeleteTree,
    GetContentStream,
    SetContentStream,
    DeleteContentStream,
    GetAllVersions,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetObjectParents => "canGetObjectParents",
            Action::GetProperties => "canGetProperties",
            Action::UpdateProperties => "canUpdateProperties",
            Action::MoveObject => "canMoveObject",
            Action::DeleteObject => "canDeleteObject",
            Action::GetAcl => "canGetACL",
            Action::GetDescendants => "canGetDescendants",
            Action::GetChildren => "canGetChildren",
            Action::GetFolderParent => "canGetFolderParent",
            Action::GetFolderTree => "canGetFolderTree",
            Action::CreateDocument => "canCreateDocument",
            Action::CreateFolder => "canCreateFolder",
            Action::DeleteTree => "canDeleteTree",
            Action::GetContentStream => "canGetContentStream",
            Action::SetContentStream => "canSetContentStream",
            Action::DeleteContentStream => "canDeleteContentStream",
            Action::GetAllVersions => "canGetAllVersions",
        }
    }
}

pub type AllowableActions = BTreeSet<Action>;

/// Access-control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AceEntry {
    pub principal: String,
    pub permissions: Vec<String>,
    /// Always true; nothing is inherited.
    pub direct: bool,
}

/// Registered principals and whether each is read-only.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<BTreeMap<String, bool>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, user: &str) -> Result<(), ApiError> {
        self.set(user, true)
    }

    pub fn set_read_write(&self, user: &str) -> Result<(), ApiError> {
        self.set(user, false)
    }

    fn set(&self, user: &str, read_only: bool) -> Result<(), ApiError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(ApiError::InvalidArgument("User name is empty".to_string()));
        }
        self.users.write().insert(user.to_string(), read_only);
        Ok(())
    }

    /// `None` for unknown users.
    pub fn is_read_only(&self, user: &str) -> Option<bool> {
        self.users.read().get(user).copied()
    }

    /// Principals sorted by id, with their read-only flag.
    pub fn principals(&self) -> Vec<(String, bool)> {
        self.users
            .read()
            .iter()
            .map(|(user, ro)| (user.clone(), *ro))
            .collect()
    }

    /// Authorize a caller. Returns the caller's read-only flag.
    pub fn check_user(&self, ctx: &CallContext, write_required: bool) -> Result<bool, ApiError> {
        let user = ctx
            .username
            .as_deref()
            .ok_or_else(|| ApiError::PermissionDenied("No user given".to_string()))?;
        let read_only = self
            .is_read_only(user)
            .ok_or_else(|| ApiError::PermissionDenied(format!("Unknown user: {}", user)))?;
        if read_only && write_required {
            debug!(user, "Write refused for read-only user");
            return Err(ApiError::PermissionDenied(format!(
                "User {} is read-only",
                user
            )));
        }
        Ok(read_only)
    }
}

pub struct AccessControlEvaluator {
    users: Arc<UserRegistry>,
}

impl AccessControlEvaluator {
    pub fn new(users: Arc<UserRegistry>) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn allowable_actions(&self, node: &RepositoryNode, user_read_only: bool) -> AllowableActions {
        let root = node.is_root();
        let can_write = !user_read_only;
        let writable = node.writable;

        let mut actions = BTreeSet::new();
        let mut grant = |action: Action, allowed: bool| {
            if allowed {
                actions.insert(action);
            }
        };

        grant(Action::GetObjectParents, !root);
        grant(Action::GetProperties, true);
        grant(Action::UpdateProperties, can_write && writable);
        grant(Action::MoveObject, can_write && !root);
        grant(Action::DeleteObject, can_write && writable && !root);
        grant(Action::GetAcl, true);

        if node.is_folder() {
            grant(Action::GetDescendants, true);
            grant(Action::GetChildren, true);
            grant(Action::GetFolderParent, !root);
            grant(Action::GetFolderTree, true);
            grant(Action::CreateDocument, can_write);
            grant(Action::CreateFolder, can_write);
            grant(Action::DeleteTree, can_write && writable);
        } else {
            grant(Action::GetContentStream, node.size > 0);
            grant(Action::SetContentStream, can_write && writable);
            grant(Action::DeleteContentStream, can_write && writable);
            grant(Action::GetAllVersions, true);
        }
        actions
    }

    /// One direct entry per registered principal, sorted by principal.
    pub fn acl(&self, node: &RepositoryNode) -> Vec<AceEntry> {
        self.users
            .principals()
            .into_iter()
            .map(|(principal, read_only)| {
                let mut permissions = vec![PERMISSION_READ.to_string()];
                if !read_only && node.writable {
                    permissions.push(PERMISSION_WRITE.to_string());
                    permissions.push(PERMISSION_ALL.to_string());
                }
                AceEntry {
                    principal,
                    permissions,
                    direct: true,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;
    use chrono::Utc;
    use std::path::PathBuf;

    fn node(repo_path: &str, kind: NodeKind, size: u64, writable: bool) -> RepositoryNode {
        RepositoryNode {
            path: PathBuf::from("/srv").join(repo_path.trim_start_matches('/')),
            repo_path: repo_path.to_string(),
            name: repo_path.rsplit('/').next().unwrap_or_default().to_string(),
            kind,
            size,
            modified: Utc::now(),
            writable,
        }
    }

    fn evaluator() -> AccessControlEvaluator {
        let users = Arc::new(UserRegistry::new());
        users.set_read_write("zed").unwrap();
        users.set_read_only("alice").unwrap();
        AccessControlEvaluator::new(users)
    }

    #[test]
    fn test_root_folder_actions() {
        let actions = evaluator().allowable_actions(&node("/", NodeKind::Folder, 0, true), false);
        assert!(actions.contains(&Action::GetChildren));
        assert!(actions.contains(&Action::CreateFolder));
        assert!(!actions.contains(&Action::GetObjectParents));
        assert!(!actions.contains(&Action::GetFolderParent));
        assert!(!actions.contains(&Action::MoveObject));
        assert!(!actions.contains(&Action::DeleteObject));
    }

    #[test]
    fn test_read_only_document_actions() {
        let doc = node("/U1/representations/r/data/a.txt", NodeKind::Document, 10, true);
        let actions = evaluator().allowable_actions(&doc, true);
        assert!(actions.contains(&Action::GetContentStream));
        assert!(actions.contains(&Action::GetAllVersions));
        assert!(!actions.contains(&Action::SetContentStream));
        assert!(!actions.contains(&Action::UpdateProperties));
        assert!(!actions.contains(&Action::GetChildren));

        let empty = node("/U1/representations/r/data/b", NodeKind::Document, 0, false);
        let actions = evaluator().allowable_actions(&empty, false);
        assert!(!actions.contains(&Action::GetContentStream));
        assert!(!actions.contains(&Action::DeleteObject));
        assert!(actions.contains(&Action::MoveObject));
    }

    #[test]
    fn test_acl_entries() {
        let evaluator = evaluator();
        let acl = evaluator.acl(&node("/U1", NodeKind::Folder, 0, true));
        assert_eq!(acl.len(), 2);
        assert_eq!(acl[0].principal, "alice");
        assert_eq!(acl[0].permissions, vec![PERMISSION_READ]);
        assert_eq!(acl[1].principal, "zed");
        assert_eq!(
            acl[1].permissions,
            vec![PERMISSION_READ, PERMISSION_WRITE, PERMISSION_ALL]
        );
        assert!(acl.iter().all(|a| a.direct));

        let acl = evaluator.acl(&node("/U1", NodeKind::Folder, 0, false));
        assert_eq!(acl[1].permissions, vec![PERMISSION_READ]);
    }

    #[test]
    fn test_check_user() {
        let evaluator = evaluator();
        let users = evaluator.users();
        assert!(users.check_user(&CallContext::new("alice"), false).unwrap());
        assert!(matches!(
            users.check_user(&CallContext::new("alice"), true),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(!users.check_user(&CallContext::new("zed"), true).unwrap());
        assert!(users.check_user(&CallContext::new("mallory"), false).is_err());
        assert!(users.check_user(&CallContext::anonymous(), false).is_err());
        assert!(users.set_read_only("  ").is_err());
    }
}
