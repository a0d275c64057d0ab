//! Typed property bags and their projection from repository nodes.

pub mod dates;
pub mod mime;
pub mod projector;

pub use mime::{ExtensionSniffer, MimeSniffer};
pub use projector::{Projection, PropertyProjector};

use crate::error::ApiError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::ids;

/// Property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Present in the bag but explicitly unset.
    Null,
    String(String),
    Id(String),
    Boolean(bool),
    Integer(i64),
    DateTime(DateTime<Utc>),
    IdList(Vec<String>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Textual form used by LIKE and by plain-text output.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::String(s) | PropertyValue::Id(s) => Some(s.clone()),
            PropertyValue::Boolean(b) => Some(b.to_string()),
            PropertyValue::Integer(i) => Some(i.to_string()),
            PropertyValue::DateTime(d) => Some(d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            PropertyValue::IdList(ids) => Some(ids.join(",")),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::String(s) | PropertyValue::Id(s) => Value::String(s.clone()),
            PropertyValue::Boolean(b) => Value::Bool(*b),
            PropertyValue::Integer(i) => Value::from(*i),
            PropertyValue::DateTime(_) => self.as_text().map(Value::String).unwrap_or(Value::Null),
            PropertyValue::IdList(ids) => {
                Value::Array(ids.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Insertion-ordered property map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing an existing value in place.
    pub fn insert(&mut self, id: impl Into<String>, value: PropertyValue) {
        let id = id.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((id, value)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(k));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// String value of `id`, for ids and strings.
    pub fn string(&self, id: &str) -> Option<&str> {
        match self.get(id)? {
            PropertyValue::String(s) | PropertyValue::Id(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Caller-supplied property filter over query names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyFilter {
    All,
    Only(BTreeSet<String>),
}

impl PropertyFilter {
    /// Parse a comma-separated filter. Absent, empty or any `*` selects
    /// everything; an explicit list always keeps the identity properties.
    pub fn parse(filter: Option<&str>) -> Result<Self, ApiError> {
        let raw = match filter.map(str::trim) {
            None | Some("") => return Ok(PropertyFilter::All),
            Some(raw) => raw,
        };
        if raw.contains('*') {
            return Ok(PropertyFilter::All);
        }
        let mut names = BTreeSet::new();
        for part in raw.split(',') {
            let name = part.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ApiError::InvalidArgument(format!("Invalid filter: {}", raw)));
            }
            names.insert(name.to_string());
        }
        names.insert(ids::OBJECT_ID.to_string());
        names.insert(ids::OBJECT_TYPE_ID.to_string());
        names.insert(ids::BASE_TYPE_ID.to_string());
        Ok(PropertyFilter::Only(names))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyFilter::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, query_name: &str) -> bool {
        match self {
            PropertyFilter::All => true,
            PropertyFilter::Only(names) => names.contains(query_name),
        }
    }
}
