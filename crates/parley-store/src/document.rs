//! Documents, snapshot batches and query ordering

use std::cmp::Ordering;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocumentId};

/// Field map of a stored document
pub type Fields = serde_json::Map<String, Value>;

/// Encode a serializable record into a field map.
///
/// The record must serialize to a JSON object.
pub fn to_fields<T: Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned or caller-chosen id
    pub id: DocumentId,
    /// Field values
    pub fields: Fields,
}

impl Document {
    /// Create a document
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Get a raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a string field, if present and a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Get an integer field, if present and an integer
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Decode the fields into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// The complete current document list of one query.
///
/// Every batch delivered by a subscription carries the full result set,
/// never a diff against the previous batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotBatch {
    /// Collection the batch was taken from
    pub collection: CollectionPath,
    /// Documents in query order
    pub documents: Vec<Document>,
}

impl SnapshotBatch {
    /// Create a batch
    pub fn new(collection: CollectionPath, documents: Vec<Document>) -> Self {
        Self {
            collection,
            documents,
        }
    }

    /// Number of documents in the batch
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the batch has no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate documents in query order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}

/// Sort direction for [`OrderBy`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Ordering clause of a subscription query.
///
/// Documents lacking the field are excluded from ordered results.
/// Ties are broken by document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to sort on
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

impl OrderBy {
    /// Order ascending by a field
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Whether a document takes part in the ordered result
    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field).is_some_and(|v| !v.is_null())
    }

    /// Compare two documents under this clause
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let by_field = match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let by_field = match self.direction {
            Direction::Ascending => by_field,
            Direction::Descending => by_field.reverse(),
        };
        by_field.then_with(|| a.id.cmp(&b.id))
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(f64::NAN)
                .total_cmp(&y.as_f64().unwrap_or(f64::NAN)),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
