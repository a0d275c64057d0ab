//! Objects returned by the repository surface.

use crate::acl::{AceEntry, AllowableActions};
use crate::pagination::Page;
use crate::properties::{PropertyBag, PropertyFilter};
use crate::schema::BaseType;
use crate::types::{CmisVersion, ObjectId};
use serde::Serialize;

/// What to compile for each returned object.
#[derive(Debug, Clone)]
pub struct ObjectOptions {
    pub filter: PropertyFilter,
    pub include_allowable_actions: bool,
    pub include_acl: bool,
    pub include_path_segment: bool,
    pub cmis_version: CmisVersion,
    /// Read-only flag of the calling user, for allowable actions.
    pub user_read_only: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            filter: PropertyFilter::All,
            include_allowable_actions: false,
            include_acl: false,
            include_path_segment: false,
            cmis_version: CmisVersion::default(),
            user_read_only: true,
        }
    }
}

impl ObjectOptions {
    pub fn with_filter(mut self, filter: PropertyFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_allowable_actions(mut self, include: bool) -> Self {
        self.include_allowable_actions = include;
        self
    }

    pub fn with_acl(mut self, include: bool) -> Self {
        self.include_acl = include;
        self
    }

    pub fn with_path_segment(mut self, include: bool) -> Self {
        self.include_path_segment = include;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectData {
    pub id: ObjectId,
    pub base_type: BaseType,
    pub type_id: String,
    pub has_content: bool,
    #[serde(serialize_with = "serialize_bag")]
    pub properties: PropertyBag,
    pub allowable_actions: Option<AllowableActions>,
    pub acl: Option<Vec<AceEntry>>,
}

fn serialize_bag<S: serde::Serializer>(bag: &PropertyBag, serializer: S) -> Result<S::Ok, S::Error> {
    bag.to_json().serialize(serializer)
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectInFolder {
    pub object: ObjectData,
    pub path_segment: Option<String>,
}

/// Object with its descendants.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInFolderContainer {
    pub object: ObjectInFolder,
    pub children: Vec<ObjectInFolderContainer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectParent {
    pub object: ObjectData,
    pub relative_path_segment: Option<String>,
}

pub type ChildrenPage = Page<ObjectInFolder>;
pub type ObjectList = Page<ObjectData>;
