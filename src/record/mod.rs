//! Inventory records and the documents they are persisted as.
//!
//! A [`Record`] is what the view shows; [`RecordFields`] is the field set
//! written to the remote collection; [`Document`] is a raw remote document as
//! it arrives in a snapshot. Decoding a document into a record never fails:
//! a missing or malformed field falls back to its empty value.

mod draft;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use draft::EditorDraft;

pub const NAME_FIELD: &str = "name";
pub const QUANTITY_FIELD: &str = "quantity";
pub const DESCRIPTION_FIELD: &str = "description";

/// A single inventory entry.
///
/// `id` is empty until the record has been written once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub description: String,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            description: description.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Decode a snapshot document, defaulting any missing or mistyped field.
    pub fn from_document(document: &Document) -> Self {
        let fields = &document.fields;
        Self {
            id: document.id.clone(),
            name: string_field(fields, NAME_FIELD),
            quantity: fields
                .get(QUANTITY_FIELD)
                .and_then(Value::as_u64)
                .and_then(|q| u32::try_from(q).ok())
                .unwrap_or(0),
            description: string_field(fields, DESCRIPTION_FIELD),
        }
    }

    pub fn fields(&self) -> RecordFields {
        RecordFields {
            name: self.name.clone(),
            quantity: self.quantity,
            description: self.description.clone(),
        }
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// The persisted shape of a record: everything except its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub name: String,
    pub quantity: u32,
    pub description: String,
}

impl RecordFields {
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(NAME_FIELD.to_string(), Value::from(self.name.clone()));
        map.insert(QUANTITY_FIELD.to_string(), Value::from(self.quantity));
        map.insert(
            DESCRIPTION_FIELD.to_string(),
            Value::from(self.description.clone()),
        );
        map
    }

    pub fn into_record(self, id: impl Into<String>) -> Record {
        Record {
            id: id.into(),
            name: self.name,
            quantity: self.quantity,
            description: self.description,
        }
    }
}

/// A raw document from a remote snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON value. Non-object values yield no fields.
    pub fn from_json(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, fields)
    }

    /// The `name` field for ordering; empty when absent.
    pub fn name(&self) -> &str {
        self.fields
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
