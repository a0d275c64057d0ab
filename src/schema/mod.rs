//! Object-type schema
//!
//! Type and property definitions are supplied through [`SchemaCatalog`]. The
//! bridge ships [`StaticCatalog`] with the folder, base document and archival
//! document types; a protocol binding may provide its own catalog.

pub mod catalog;
pub mod fields;

pub use catalog::StaticCatalog;
pub use fields::{descriptive_field, DescriptiveField, MetadataSchema, DESCRIPTIVE_FIELDS};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FOLDER_TYPE: &str = "cmis:folder";
pub const DOCUMENT_TYPE: &str = "cmis:document";
pub const ARCHIVAL_DOCUMENT_TYPE: &str = "cmis:archivalDocument";

/// Property ids of the base types.
pub mod ids {
    pub const OBJECT_ID: &str = "cmis:objectId";
    pub const NAME: &str = "cmis:name";
    pub const DESCRIPTION: &str = "cmis:description";
    pub const CREATED_BY: &str = "cmis:createdBy";
    pub const CREATION_DATE: &str = "cmis:creationDate";
    pub const LAST_MODIFIED_BY: &str = "cmis:lastModifiedBy";
    pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";
    pub const CHANGE_TOKEN: &str = "cmis:changeToken";
    pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
    pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
    pub const SECONDARY_OBJECT_TYPE_IDS: &str = "cmis:secondaryObjectTypeIds";
    pub const PATH: &str = "cmis:path";

    pub const PARENT_ID: &str = "cmis:parentId";
    pub const ALLOWED_CHILD_OBJECT_TYPE_IDS: &str = "cmis:allowedChildObjectTypeIds";

    pub const IS_IMMUTABLE: &str = "cmis:isImmutable";
    pub const IS_LATEST_VERSION: &str = "cmis:isLatestVersion";
    pub const IS_MAJOR_VERSION: &str = "cmis:isMajorVersion";
    pub const IS_LATEST_MAJOR_VERSION: &str = "cmis:isLatestMajorVersion";
    pub const IS_PRIVATE_WORKING_COPY: &str = "cmis:isPrivateWorkingCopy";
    pub const VERSION_LABEL: &str = "cmis:versionLabel";
    pub const VERSION_SERIES_ID: &str = "cmis:versionSeriesId";
    pub const IS_VERSION_SERIES_CHECKED_OUT: &str = "cmis:isVersionSeriesCheckedOut";
    pub const VERSION_SERIES_CHECKED_OUT_BY: &str = "cmis:versionSeriesCheckedOutBy";
    pub const VERSION_SERIES_CHECKED_OUT_ID: &str = "cmis:versionSeriesCheckedOutId";
    pub const CHECKIN_COMMENT: &str = "cmis:checkinComment";
    pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";
    pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
    pub const CONTENT_STREAM_FILE_NAME: &str = "cmis:contentStreamFileName";
    pub const CONTENT_STREAM_ID: &str = "cmis:contentStreamId";
}

/// Base type of an object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Folder,
    Document,
}

impl BaseType {
    pub fn id(&self) -> &'static str {
        match self {
            BaseType::Folder => FOLDER_TYPE,
            BaseType::Document => DOCUMENT_TYPE,
        }
    }
}

/// Data kind of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    String,
    Id,
    IdList,
    Boolean,
    Integer,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Updatability {
    ReadOnly,
    ReadWrite,
    OnCreate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    pub query_name: String,
    pub display_name: String,
    pub kind: PropertyKind,
    pub updatability: Updatability,
    pub required: bool,
    pub queryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSchema {
    pub id: String,
    pub query_name: String,
    pub display_name: String,
    pub base: BaseType,
    pub parent: Option<String>,
    pub creatable: bool,
    pub queryable: bool,
    pub properties: BTreeMap<String, PropertyDefinition>,
}

impl TypeSchema {
    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.properties.get(id)
    }

    /// Look a property up by query name, falling back to its id.
    pub fn property_by_query_name(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties
            .values()
            .find(|p| p.query_name == name)
            .or_else(|| self.properties.get(name))
    }
}

/// External catalog of object types.
pub trait SchemaCatalog: Send + Sync {
    fn type_definition(&self, type_id: &str) -> Option<&TypeSchema>;

    fn types(&self) -> Vec<&TypeSchema>;

    /// Resolve a type by id or query name.
    fn resolve(&self, name: &str) -> Option<&TypeSchema> {
        self.type_definition(name)
            .or_else(|| self.types().into_iter().find(|t| t.query_name == name))
            .or_else(|| {
                self.types()
                    .into_iter()
                    .find(|t| t.id.eq_ignore_ascii_case(name))
            })
    }

    fn type_children(&self, parent: Option<&str>) -> Vec<&TypeSchema> {
        self.types()
            .into_iter()
            .filter(|t| t.parent.as_deref() == parent)
            .collect()
    }
}
