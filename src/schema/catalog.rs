//! Built-in type catalog

use super::fields::DESCRIPTIVE_FIELDS;
use super::ids;
use super::{
    BaseType, PropertyDefinition, PropertyKind, SchemaCatalog, TypeSchema, Updatability,
    ARCHIVAL_DOCUMENT_TYPE, DOCUMENT_TYPE, FOLDER_TYPE,
};
use std::collections::BTreeMap;

/// Folder, base document and archival document types.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    types: BTreeMap<String, TypeSchema>,
}

fn prop(id: &str, kind: PropertyKind, updatability: Updatability) -> PropertyDefinition {
    PropertyDefinition {
        id: id.to_string(),
        query_name: id.to_string(),
        display_name: id.trim_start_matches("cmis:").to_string(),
        kind,
        updatability,
        required: false,
        queryable: true,
    }
}

fn required(mut def: PropertyDefinition) -> PropertyDefinition {
    def.required = true;
    def
}

fn common_properties() -> Vec<PropertyDefinition> {
    use PropertyKind::*;
    use Updatability::*;
    vec![
        prop(ids::OBJECT_ID, Id, ReadOnly),
        required(prop(ids::NAME, String, ReadWrite)),
        prop(ids::DESCRIPTION, String, ReadWrite),
        prop(ids::CREATED_BY, String, ReadOnly),
        prop(ids::CREATION_DATE, DateTime, ReadOnly),
        prop(ids::LAST_MODIFIED_BY, String, ReadOnly),
        prop(ids::LAST_MODIFICATION_DATE, DateTime, ReadOnly),
        prop(ids::CHANGE_TOKEN, String, ReadOnly),
        prop(ids::BASE_TYPE_ID, Id, ReadOnly),
        required(prop(ids::OBJECT_TYPE_ID, Id, OnCreate)),
        prop(ids::SECONDARY_OBJECT_TYPE_IDS, IdList, ReadWrite),
        prop(ids::PATH, String, ReadOnly),
    ]
}

fn folder_type() -> TypeSchema {
    use PropertyKind::*;
    let mut properties = common_properties();
    properties.push(prop(ids::PARENT_ID, Id, Updatability::ReadOnly));
    properties.push(prop(
        ids::ALLOWED_CHILD_OBJECT_TYPE_IDS,
        IdList,
        Updatability::ReadOnly,
    ));
    TypeSchema {
        id: FOLDER_TYPE.to_string(),
        query_name: FOLDER_TYPE.to_string(),
        display_name: "Folder".to_string(),
        base: BaseType::Folder,
        parent: None,
        creatable: true,
        queryable: true,
        properties: into_map(properties),
    }
}

fn document_properties() -> Vec<PropertyDefinition> {
    use PropertyKind::*;
    use Updatability::*;
    let mut properties = common_properties();
    properties.extend([
        prop(ids::IS_IMMUTABLE, Boolean, ReadOnly),
        prop(ids::IS_LATEST_VERSION, Boolean, ReadOnly),
        prop(ids::IS_MAJOR_VERSION, Boolean, ReadOnly),
        prop(ids::IS_LATEST_MAJOR_VERSION, Boolean, ReadOnly),
        prop(ids::IS_PRIVATE_WORKING_COPY, Boolean, ReadOnly),
        prop(ids::VERSION_LABEL, String, ReadOnly),
        prop(ids::VERSION_SERIES_ID, Id, ReadOnly),
        prop(ids::IS_VERSION_SERIES_CHECKED_OUT, Boolean, ReadOnly),
        prop(ids::VERSION_SERIES_CHECKED_OUT_BY, String, ReadOnly),
        prop(ids::VERSION_SERIES_CHECKED_OUT_ID, Id, ReadOnly),
        prop(ids::CHECKIN_COMMENT, String, ReadOnly),
        prop(ids::CONTENT_STREAM_LENGTH, Integer, ReadOnly),
        prop(ids::CONTENT_STREAM_MIME_TYPE, String, ReadOnly),
        prop(ids::CONTENT_STREAM_FILE_NAME, String, ReadOnly),
        prop(ids::CONTENT_STREAM_ID, Id, ReadOnly),
    ]);
    properties
}

fn document_type() -> TypeSchema {
    TypeSchema {
        id: DOCUMENT_TYPE.to_string(),
        query_name: DOCUMENT_TYPE.to_string(),
        display_name: "Document".to_string(),
        base: BaseType::Document,
        parent: None,
        creatable: true,
        queryable: true,
        properties: into_map(document_properties()),
    }
}

fn archival_document_type() -> TypeSchema {
    let mut properties = document_properties();
    properties.extend(DESCRIPTIVE_FIELDS.iter().map(|field| PropertyDefinition {
        id: field.id.to_string(),
        query_name: field.id.to_string(),
        display_name: field.display_name.to_string(),
        kind: if field.is_date {
            PropertyKind::DateTime
        } else {
            PropertyKind::String
        },
        updatability: Updatability::ReadOnly,
        required: false,
        queryable: true,
    }));
    TypeSchema {
        id: ARCHIVAL_DOCUMENT_TYPE.to_string(),
        query_name: ARCHIVAL_DOCUMENT_TYPE.to_string(),
        display_name: "Archival Document".to_string(),
        base: BaseType::Document,
        parent: Some(DOCUMENT_TYPE.to_string()),
        creatable: true,
        queryable: true,
        properties: into_map(properties),
    }
}

fn into_map(properties: Vec<PropertyDefinition>) -> BTreeMap<String, PropertyDefinition> {
    properties.into_iter().map(|p| (p.id.clone(), p)).collect()
}

impl StaticCatalog {
    pub fn standard() -> Self {
        let types = [folder_type(), document_type(), archival_document_type()]
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        Self { types }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaCatalog for StaticCatalog {
    fn type_definition(&self, type_id: &str) -> Option<&TypeSchema> {
        self.types.get(type_id)
    }

    fn types(&self) -> Vec<&TypeSchema> {
        self.types.values().collect()
    }
}
