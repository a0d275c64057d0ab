//! Descriptive-metadata field catalog
//!
//! The archival document type exposes one property per descriptive field of
//! the three supported metadata schemas. Values come from the unit's
//! [`MetadataBundle`](crate::unit::MetadataBundle).

use serde::{Deserialize, Serialize};

/// Source schema of a descriptive field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataSchema {
    /// Encoded Archival Description 2002
    Ead,
    /// Simple Dublin Core (2002-12-12)
    DublinCore,
    KeyValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptiveField {
    pub id: &'static str,
    pub display_name: &'static str,
    pub schema: MetadataSchema,
    /// Stored as a date-time; the source text is parsed best-effort.
    pub is_date: bool,
}

const fn text(schema: MetadataSchema, id: &'static str, display_name: &'static str) -> DescriptiveField {
    DescriptiveField {
        id,
        display_name,
        schema,
        is_date: false,
    }
}

const fn date(schema: MetadataSchema, id: &'static str, display_name: &'static str) -> DescriptiveField {
    DescriptiveField {
        id,
        display_name,
        schema,
        is_date: true,
    }
}

pub const DESCRIPTIVE_FIELDS: &[DescriptiveField] = &[
    text(MetadataSchema::Ead, "metadata:ead:unitId", "EAD Unit Id"),
    text(MetadataSchema::Ead, "metadata:ead:unitTitle", "EAD Unit Title"),
    text(MetadataSchema::Ead, "metadata:ead:countryCode", "EAD Country Code"),
    text(MetadataSchema::Ead, "metadata:ead:repositoryCode", "EAD Repository Code"),
    text(MetadataSchema::Ead, "metadata:ead:unitDate", "EAD Unit Date"),
    text(MetadataSchema::Ead, "metadata:ead:unitDateLabel", "EAD Unit Date Label"),
    text(MetadataSchema::Ead, "metadata:ead:unitDateNormal", "EAD Unit Date Normal"),
    text(MetadataSchema::Ead, "metadata:ead:physicalDescription", "EAD Physical Description"),
    text(MetadataSchema::Ead, "metadata:ead:physicalDescriptionExtent", "EAD Physical Description Extent"),
    text(MetadataSchema::Ead, "metadata:ead:physicalDescriptionDimensions", "EAD Physical Description Dimensions"),
    text(MetadataSchema::Ead, "metadata:ead:physicalDescriptionAppearance", "EAD Physical Description Appearance"),
    text(MetadataSchema::Ead, "metadata:ead:repositoryName", "EAD Repository Name"),
    text(MetadataSchema::Ead, "metadata:ead:langMaterial", "EAD Lang Material"),
    text(MetadataSchema::Ead, "metadata:ead:langMaterialLanguage", "EAD Lang Material Language"),
    text(MetadataSchema::Ead, "metadata:ead:noteSourcesDescription", "EAD Note Sources Description"),
    text(MetadataSchema::Ead, "metadata:ead:noteGeneralNote", "EAD Note General Note"),
    text(MetadataSchema::Ead, "metadata:ead:origination", "EAD Origination"),
    text(MetadataSchema::Ead, "metadata:ead:originationCreator", "EAD Origination Creator"),
    text(MetadataSchema::Ead, "metadata:ead:originationProducer", "EAD Origination Producer"),
    text(MetadataSchema::Ead, "metadata:ead:archiveDescription", "EAD Archive Description"),
    text(MetadataSchema::Ead, "metadata:ead:materialSpecification", "EAD Material Specification"),
    text(MetadataSchema::Ead, "metadata:ead:oddLevelOfDetail", "EAD Odd Level Of Detail"),
    text(MetadataSchema::Ead, "metadata:ead:oddStatusDescription", "EAD Odd Status Description"),
    text(MetadataSchema::Ead, "metadata:ead:scopeContent", "EAD Scope Content"),
    text(MetadataSchema::Ead, "metadata:ead:arrangement", "EAD Arrangement"),
    text(MetadataSchema::Ead, "metadata:ead:appraisal", "EAD Appraisal"),
    text(MetadataSchema::Ead, "metadata:ead:acquisitionInfo", "EAD Acquisition Info"),
    text(MetadataSchema::Ead, "metadata:ead:accruals", "EAD Accruals"),
    text(MetadataSchema::Ead, "metadata:ead:custodialHistory", "EAD Custodial History"),
    date(MetadataSchema::Ead, "metadata:ead:processInfoDate", "EAD Process Info Date"),
    text(MetadataSchema::Ead, "metadata:ead:processInfoArchivistNotes", "EAD Process Info Archivist Notes"),
    text(MetadataSchema::Ead, "metadata:ead:originalsLocation", "EAD Originals Location"),
    text(MetadataSchema::Ead, "metadata:ead:alternativeFormAvailable", "EAD Alternative Form Available"),
    text(MetadataSchema::Ead, "metadata:ead:relatedMaterial", "EAD Related Material"),
    text(MetadataSchema::Ead, "metadata:ead:accessRestrictions", "EAD Access Restrictions"),
    text(MetadataSchema::Ead, "metadata:ead:useRestrictions", "EAD Use Restrictions"),
    text(MetadataSchema::Ead, "metadata:ead:otherFindAid", "EAD Other Find Aid"),
    text(MetadataSchema::Ead, "metadata:ead:physicalTech", "EAD Physical Tech"),
    text(MetadataSchema::Ead, "metadata:ead:bibliography", "EAD Bibliography"),
    text(MetadataSchema::Ead, "metadata:ead:preferCite", "EAD Prefer Cite"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:title", "Dublin Core Title"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:identifier", "Dublin Core Identifier"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:creator", "Dublin Core Creator"),
    date(MetadataSchema::DublinCore, "metadata:dublinCore:initialDate", "Dublin Core Initial Date"),
    date(MetadataSchema::DublinCore, "metadata:dublinCore:finalDate", "Dublin Core Final Date"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:description", "Dublin Core Description"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:publisher", "Dublin Core Publisher"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:contributor", "Dublin Core Contributor"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:rights", "Dublin Core Rights"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:language", "Dublin Core Language"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:coverage", "Dublin Core Coverage"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:format", "Dublin Core Format"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:relation", "Dublin Core Relation"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:subject", "Dublin Core Subject"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:type", "Dublin Core Type"),
    text(MetadataSchema::DublinCore, "metadata:dublinCore:source", "Dublin Core Source"),
    text(MetadataSchema::KeyValue, "metadata:keyValue:id", "Key-Value Id"),
    text(MetadataSchema::KeyValue, "metadata:keyValue:title", "Key-Value Title"),
    text(MetadataSchema::KeyValue, "metadata:keyValue:producer", "Key-Value Producer"),
    date(MetadataSchema::KeyValue, "metadata:keyValue:date", "Key-Value Date"),
];

pub fn descriptive_field(id: &str) -> Option<&'static DescriptiveField> {
    DESCRIPTIVE_FIELDS.iter().find(|f| f.id == id)
}
