//! Node -> property bag projection

use crate::codec::PathIdentifierCodec;
use crate::error::ApiError;
use crate::index::{IndexRecord, MetadataIndex, StorageClass};
use crate::properties::dates::{parse_descriptive_date, round_up_to_second};
use crate::properties::mime::MimeSniffer;
use crate::properties::{PropertyBag, PropertyFilter, PropertyValue};
use crate::schema::{
    ids, BaseType, PropertyKind, SchemaCatalog, TypeSchema, ARCHIVAL_DOCUMENT_TYPE, FOLDER_TYPE,
};
use crate::tree::{RepositoryNode, Zone};
use crate::types::{CmisVersion, ObjectId, UNKNOWN_USER};
use crate::unit::UnitCache;
use std::sync::Arc;
use tracing::warn;

/// Properties introduced by protocol 1.1.
const VERSION_1_1_ONLY: [&str; 3] = [
    ids::DESCRIPTION,
    ids::SECONDARY_OBJECT_TYPE_IDS,
    ids::IS_PRIVATE_WORKING_COPY,
];

/// Result of projecting one node.
#[derive(Debug, Clone)]
pub struct Projection {
    pub id: ObjectId,
    pub base: BaseType,
    pub type_id: String,
    /// True for documents with a non-empty content stream.
    pub has_content: bool,
    pub properties: PropertyBag,
}

pub struct PropertyProjector {
    codec: PathIdentifierCodec,
    schema: Arc<dyn SchemaCatalog>,
    units: Arc<dyn UnitCache>,
    index: Arc<dyn MetadataIndex>,
    mime: Arc<dyn MimeSniffer>,
}

impl PropertyProjector {
    pub fn new(
        codec: PathIdentifierCodec,
        schema: Arc<dyn SchemaCatalog>,
        units: Arc<dyn UnitCache>,
        index: Arc<dyn MetadataIndex>,
        mime: Arc<dyn MimeSniffer>,
    ) -> Self {
        Self {
            codec,
            schema,
            units,
            index,
            mime,
        }
    }

    pub fn codec(&self) -> &PathIdentifierCodec {
        &self.codec
    }

    pub fn schema(&self) -> &dyn SchemaCatalog {
        self.schema.as_ref()
    }

    pub fn units(&self) -> &dyn UnitCache {
        self.units.as_ref()
    }

    pub fn index(&self) -> &dyn MetadataIndex {
        self.index.as_ref()
    }

    pub fn mime(&self) -> &dyn MimeSniffer {
        self.mime.as_ref()
    }

    /// Object type a node is exposed as.
    pub fn type_of(&self, node: &RepositoryNode) -> Result<&TypeSchema, ApiError> {
        let type_id = if node.is_folder() {
            FOLDER_TYPE
        } else {
            ARCHIVAL_DOCUMENT_TYPE
        };
        self.schema
            .type_definition(type_id)
            .ok_or_else(|| ApiError::NotFound(format!("Type {} is not defined", type_id)))
    }

    /// Project a node, optionally upserting the unfiltered bag into the index,
    /// then narrow it to `version` and apply `filter`.
    ///
    /// The indexed bag always carries the newest protocol's property set.
    pub fn project(
        &self,
        node: &RepositoryNode,
        filter: &PropertyFilter,
        version: CmisVersion,
        write_through: bool,
    ) -> Result<Projection, ApiError> {
        let schema = self.type_of(node)?;
        let id = self.codec.encode(&node.path)?;
        let mut properties = self.full_bag(node, schema, &id)?;

        if write_through && node.zone() == Zone::Content {
            self.write_through(node, schema, &id, &properties);
        }
        if version == CmisVersion::V1_0 {
            properties.retain(|key| !VERSION_1_1_ONLY.contains(&key));
        }

        if let PropertyFilter::Only(_) = filter {
            properties.retain(|key| {
                let query_name = schema
                    .property(key)
                    .map(|p| p.query_name.as_str())
                    .unwrap_or(key);
                filter.includes(query_name)
            });
        }

        Ok(Projection {
            id,
            base: schema.base,
            type_id: schema.id.clone(),
            has_content: node.is_document() && node.size > 0,
            properties,
        })
    }

    fn full_bag(
        &self,
        node: &RepositoryNode,
        schema: &TypeSchema,
        id: &ObjectId,
    ) -> Result<PropertyBag, ApiError> {
        let mut bag = PropertyBag::new();
        let modified = round_up_to_second(node.modified);

        bag.insert(ids::OBJECT_ID, PropertyValue::Id(id.to_string()));
        bag.insert(ids::NAME, PropertyValue::String(node.name.clone()));
        bag.insert(ids::CREATED_BY, PropertyValue::String(UNKNOWN_USER.to_string()));
        bag.insert(ids::CREATION_DATE, PropertyValue::DateTime(modified));
        bag.insert(
            ids::LAST_MODIFIED_BY,
            PropertyValue::String(UNKNOWN_USER.to_string()),
        );
        bag.insert(ids::LAST_MODIFICATION_DATE, PropertyValue::DateTime(modified));
        bag.insert(ids::CHANGE_TOKEN, PropertyValue::Null);
        bag.insert(ids::BASE_TYPE_ID, PropertyValue::Id(schema.base.id().to_string()));
        bag.insert(ids::OBJECT_TYPE_ID, PropertyValue::Id(schema.id.clone()));
        bag.insert(ids::PATH, PropertyValue::String(node.repo_path.clone()));
        bag.insert(ids::DESCRIPTION, PropertyValue::Null);
        bag.insert(ids::SECONDARY_OBJECT_TYPE_IDS, PropertyValue::IdList(Vec::new()));

        match schema.base {
            BaseType::Folder => {
                let parent = match node.parent_repo_path() {
                    None => PropertyValue::Null,
                    Some(parent) => {
                        PropertyValue::Id(PathIdentifierCodec::encode_repo_path(&parent).into_string())
                    }
                };
                bag.insert(ids::PARENT_ID, parent);
                bag.insert(ids::ALLOWED_CHILD_OBJECT_TYPE_IDS, PropertyValue::IdList(Vec::new()));
            }
            BaseType::Document => {
                self.document_properties(node, schema, id, &mut bag)?;
            }
        }
        Ok(bag)
    }

    fn document_properties(
        &self,
        node: &RepositoryNode,
        schema: &TypeSchema,
        id: &ObjectId,
        bag: &mut PropertyBag,
    ) -> Result<(), ApiError> {
        bag.insert(ids::IS_IMMUTABLE, PropertyValue::Boolean(false));
        bag.insert(ids::IS_LATEST_VERSION, PropertyValue::Boolean(true));
        bag.insert(ids::IS_MAJOR_VERSION, PropertyValue::Boolean(true));
        bag.insert(ids::IS_LATEST_MAJOR_VERSION, PropertyValue::Boolean(true));
        bag.insert(ids::VERSION_LABEL, PropertyValue::String(node.name.clone()));
        bag.insert(ids::VERSION_SERIES_ID, PropertyValue::Id(id.to_string()));
        bag.insert(ids::IS_VERSION_SERIES_CHECKED_OUT, PropertyValue::Boolean(false));
        bag.insert(ids::VERSION_SERIES_CHECKED_OUT_BY, PropertyValue::Null);
        bag.insert(ids::VERSION_SERIES_CHECKED_OUT_ID, PropertyValue::Null);
        bag.insert(ids::CHECKIN_COMMENT, PropertyValue::String(String::new()));
        bag.insert(ids::IS_PRIVATE_WORKING_COPY, PropertyValue::Boolean(false));

        if node.size == 0 {
            bag.insert(ids::CONTENT_STREAM_LENGTH, PropertyValue::Null);
            bag.insert(ids::CONTENT_STREAM_MIME_TYPE, PropertyValue::Null);
            bag.insert(ids::CONTENT_STREAM_FILE_NAME, PropertyValue::Null);
        } else {
            let length = i64::try_from(node.size).unwrap_or(i64::MAX);
            bag.insert(ids::CONTENT_STREAM_LENGTH, PropertyValue::Integer(length));
            bag.insert(
                ids::CONTENT_STREAM_MIME_TYPE,
                PropertyValue::String(self.mime.sniff(&node.path)),
            );
            bag.insert(
                ids::CONTENT_STREAM_FILE_NAME,
                PropertyValue::String(node.name.clone()),
            );
        }
        bag.insert(ids::CONTENT_STREAM_ID, PropertyValue::Null);

        // Files directly under the root belong to no unit.
        if node.depth() < 2 {
            return Ok(());
        }
        let Some(unit_id) = node.unit_id() else {
            return Ok(());
        };
        let unit = self.units.permission_and_metadata(unit_id)?;
        if !unit.can_read {
            return Ok(());
        }
        for (field, raw) in unit.metadata.fields() {
            let Some(definition) = schema.property(field) else {
                continue;
            };
            let value = match definition.kind {
                PropertyKind::DateTime => match parse_descriptive_date(raw) {
                    Some(date) => PropertyValue::DateTime(date),
                    None => continue,
                },
                _ => PropertyValue::String(raw.to_string()),
            };
            bag.insert(field, value);
        }
        Ok(())
    }

    fn write_through(
        &self,
        node: &RepositoryNode,
        schema: &TypeSchema,
        id: &ObjectId,
        properties: &PropertyBag,
    ) {
        let Some(container_path) = node.container_path() else {
            return;
        };
        let record = IndexRecord {
            id: id.clone(),
            class: StorageClass::of(schema.base),
            repo_path: node.repo_path.clone(),
            container_path,
            properties: properties.clone(),
        };
        if let Err(e) = self.index.upsert(&record) {
            warn!(path = %node.repo_path, error = %e, "Failed to index object");
        }
    }
}
